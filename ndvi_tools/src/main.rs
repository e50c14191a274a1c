/*
This file is part of the NDVI Tools
Copyright (C) 2022 Novel-T

The NDVI Tools are free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use anyhow::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use structopt::StructOpt;

use raster_util::raster::set_config_options;

use crate::cmd_info::{InfoArgs, print_info};
use crate::cmd_overviews::{OverviewsArgs, print_overviews};
use crate::cmd_read_window::{ReadArgs, run_read};
use crate::cmd_ndvi::{NdviArgs, run_ndvi};
use crate::cmd_quicklook::{QuicklookArgs, run_quicklook};
use crate::cmd_warp::{WarpArgs, run_warp};
use crate::cmd_build_vrt::{VrtArgs, create_vrt};
use crate::cmd_locate::{LocateArgs, run_locate};

mod raster_args;
mod cmd_info;
mod cmd_overviews;
mod cmd_read_window;
mod cmd_ndvi;
mod cmd_quicklook;
mod cmd_warp;
mod cmd_build_vrt;
mod cmd_locate;

#[derive(StructOpt)]
struct Cli {

    #[structopt(long, default_value = "Warn")]
    log_level: LevelFilter,

    #[structopt(long = "config", number_of_values = 1, help = "GDAL config option KEY=VALUE, may be repeated")]
    config: Vec<String>,

    #[structopt(subcommand)]
    cmd: Command
}

#[derive(StructOpt)]
enum Command {
    #[structopt(help="Prints driver, size, profile and per band details")]
    Info(InfoArgs),
    #[structopt(help="Lists the overview levels of a band")]
    Overviews(OverviewsArgs),
    #[structopt(help="Reads a window, optionally decimated, prints its stats and can save it")]
    Read(ReadArgs),
    #[structopt(help="(NIR - Red) / (NIR + Red) of two bands, outputs a float32 raster")]
    Ndvi(NdviArgs),
    #[structopt(help="Renders a band to a PNG")]
    Quicklook(QuicklookArgs),
    #[structopt(help="Reprojects a raster to another CRS")]
    Warp(WarpArgs),
    #[structopt(help="Builds a VRT mosaic or band stack")]
    Vrt(VrtArgs),
    #[structopt(help="Pixel and value at a coordinate")]
    Locate(LocateArgs),
}

fn run() -> Result<()> {
    let args = Cli::from_args();

    SimpleLogger::new().with_level(args.log_level).init()?;

    set_config_options(&args.config)?;

    match &args.cmd {
        Command::Info(r) => {
            print_info(r)?;
        },
        Command::Overviews(r) => {
            print_overviews(r)?;
        },
        Command::Read(r) => {
            run_read(r)?;
        },
        Command::Ndvi(r) => {
            run_ndvi(r)?;
        },
        Command::Quicklook(r) => {
            run_quicklook(r)?;
        },
        Command::Warp(r) => {
            run_warp(r)?;
        },
        Command::Vrt(r) => {
            create_vrt(r)?;
        },
        Command::Locate(r) => {
            run_locate(r)?;
        },
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}
