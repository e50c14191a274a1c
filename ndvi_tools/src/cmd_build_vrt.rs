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
use std::fs::remove_file;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use raster_util::raster::{build_vrt, RasterLocation};

#[derive(StructOpt)]
pub struct VrtArgs {
    #[structopt(required = true, min_values = 1, help = "Rasters referenced by the VRT")]
    inputs: Vec<RasterLocation>,

    #[structopt(long, parse(from_os_str))]
    output: PathBuf,

    #[structopt(long, help = "Each input becomes a band instead of being mosaicked")]
    separate: bool,

    #[structopt(long, help = "Resampling used when input resolutions differ")]
    resample: Option<String>,

    #[structopt(long)]
    clean: bool,
}

pub fn create_vrt(args: &VrtArgs) -> Result<()> {

    if args.clean && args.output.exists() {
        remove_file(&args.output)?;
    }

    if args.output.exists() {
        println!("{:?} already exists and --clean not passed, doing nothing", &args.output);
        return Ok(());
    }

    build_vrt(&args.inputs, &args.output, args.separate, args.resample.as_deref())?;

    println!("Wrote {:?} referencing {} rasters", &args.output, args.inputs.len());

    Ok(())
}
