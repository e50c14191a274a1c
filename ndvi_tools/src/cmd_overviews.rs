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
use structopt::StructOpt;

use raster_util::raster::list_overviews;

use crate::raster_args::RasterArgs;

#[derive(StructOpt)]
pub struct OverviewsArgs {
    #[structopt(flatten)]
    raster: RasterArgs,
}

pub fn print_overviews(args: &OverviewsArgs) -> Result<()> {
    let raster = args.raster.open()?;
    let band = raster.band(args.raster.band)?;

    let overviews = list_overviews(&band)?;

    println!("{} band {}: {}x{}", raster.location, args.raster.band, raster.stats.num_cols, raster.stats.num_rows);

    if overviews.is_empty() {
        println!("No overviews");
        return Ok(());
    }

    for o in overviews.iter() {
        println!("Overview {}: {}x{} (factor {})", o.index, o.width, o.height, o.factor);
    }

    Ok(())
}
