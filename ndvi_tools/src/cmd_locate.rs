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

use raster_util::raster::{pixel_of, project_point, raster_spatial_ref, read_window, spatial_ref_from, xy_of, Raster, Window};

use crate::raster_args::RasterArgs;

#[derive(StructOpt)]
pub struct LocateArgs {
    #[structopt(flatten)]
    raster: RasterArgs,

    #[structopt(long, allow_hyphen_values = true)]
    x: f64,

    #[structopt(long, allow_hyphen_values = true)]
    y: f64,

    #[structopt(long, help = "CRS of x/y when it is not the raster's, EPSG:xxxx, WKT or proj string")]
    crs: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixelLocation {
    pub row: i64,
    pub col: i64,
    //center of the pixel in the raster CRS
    pub center: (f64, f64),
    pub value: f64,
    pub is_nodata: bool,
}

/// Pixel under (x, y), None when the point is outside the raster
pub fn locate(raster: &Raster, band_index: usize, x: f64, y: f64, crs: Option<&str>) -> Result<Option<PixelLocation>> {
    let stats = raster.band_stats(band_index)?;

    let (x, y) = match crs {
        Some(def) => {
            let from = spatial_ref_from(def)?;
            let to = raster_spatial_ref(&stats)?;
            project_point(&from, &to, x, y)?
        }
        None => (x, y),
    };

    let (row, col) = match pixel_of(&stats, x, y) {
        Some(rc) => rc,
        None => return Ok(None),
    };

    let band = raster.band(band_index)?;
    let value = read_window::<f64>(&band, &stats, &Window::new(col as u32, row as u32, 1, 1))?[[0, 0]];

    Ok(Some(PixelLocation {
        row,
        col,
        center: xy_of(&stats, row, col),
        value,
        is_nodata: stats.is_nodata(value),
    }))
}

pub fn run_locate(args: &LocateArgs) -> Result<()> {
    let raster = args.raster.open()?;

    match locate(&raster, args.raster.band, args.x, args.y, args.crs.as_deref())? {
        Some(p) => {
            println!("Row {} Col {}  pixel center {}, {}", p.row, p.col, p.center.0, p.center.1);
            if p.is_nodata {
                println!("Value: nodata ({})", p.value);
            } else {
                println!("Value: {}", p.value);
            }
        }
        None => println!("{}, {} is outside of {}", args.x, args.y, raster.location),
    }

    Ok(())
}
