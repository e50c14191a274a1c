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

use anyhow::{bail, Result};
use format_num::NumberFormat;
use log::info;
use ndarray::Array2;
use structopt::StructOpt;

use raster_util::raster::{decimated_shape, parse_resample, read_decimated, write_array, RasterStats, ValueStats, Window, DEFAULT_GTIFF_OPTIONS};
use gdal::raster::GdalDataType;

use crate::raster_args::{parse_list, RasterArgs};

#[derive(StructOpt)]
pub struct ReadArgs {
    #[structopt(flatten)]
    raster: RasterArgs,

    #[structopt(long, help = "col_off,row_off,width,height", conflicts_with = "bounds")]
    window: Option<String>,

    #[structopt(long, help = "left,bottom,right,top in the raster's CRS", allow_hyphen_values = true)]
    bounds: Option<String>,

    #[structopt(long, default_value = "1", help = "Read at 1/N of the resolution")]
    decimate: u32,

    #[structopt(long, default_value = "nearest")]
    resample: String,

    #[structopt(long, parse(from_os_str), help = "Writes what was read as a GeoTIFF")]
    output: Option<PathBuf>,

    #[structopt(long)]
    clean: bool,
}

/// Pixels read with the record describing them
pub struct ReadResult {
    pub window: Window,
    pub stats: RasterStats,
    pub array: Array2<f64>,
}

pub fn select_window(stats: &RasterStats, window: Option<&str>, bounds: Option<&str>) -> Result<Window> {
    match (window, bounds) {
        (Some(_), Some(_)) => bail!("Pass either --window or --bounds, not both"),
        (Some(w), None) => {
            let v = parse_list::<u32>(w, 4)?;
            let window = Window::new(v[0], v[1], v[2], v[3]);
            window.validate(stats)?;
            Ok(window)
        }
        (None, Some(b)) => {
            let v = parse_list::<f64>(b, 4)?;
            Window::from_bounds(stats, v[0], v[1], v[2], v[3])
        }
        (None, None) => Ok(Window::full(stats)),
    }
}

pub fn read_band(args: &ReadArgs) -> Result<ReadResult> {
    let raster = args.raster.open()?;
    let band = raster.band(args.raster.band)?;
    let band_stats = raster.band_stats(args.raster.band)?;

    let window = select_window(&band_stats, args.window.as_deref(), args.bounds.as_deref())?;
    let out_shape = decimated_shape(&window, args.decimate)?;
    let resample = parse_resample(&args.resample)?;

    let array = read_decimated::<f64>(&band, &band_stats, &window, out_shape, Some(resample))?;

    let stats = window.stats(&band_stats).resized(out_shape.1 as u32, out_shape.0 as u32);

    Ok(ReadResult { window, stats, array })
}

pub fn run_read(args: &ReadArgs) -> Result<()> {
    if let Some(output) = &args.output {
        if args.clean && output.exists() {
            remove_file(output)?;
        }

        if output.exists() {
            println!("{:?} already exists and --clean not passed, doing nothing", output);
            return Ok(());
        }
    }

    let result = read_band(args)?;
    let (rows, cols) = result.array.dim();

    println!("Window: {:?}", result.window);
    println!("Array shape: {} rows x {} cols", rows, cols);

    let summary = ValueStats::from_array(&result.array, result.stats.no_data_value);

    let num = NumberFormat::new();
    if summary.count > 0 {
        println!("Valid: {}  Nodata: {}\nMin {}  Max {}  Mean {}",
                 num.format(",d", summary.count as f64),
                 num.format(",d", summary.nodata_count as f64),
                 num.format(",.4f", summary.min),
                 num.format(",.4f", summary.max),
                 num.format(",.4f", summary.sum / summary.count as f64));
    } else {
        println!("No valid pixels, {} nodata", num.format(",d", summary.nodata_count as f64));
    }

    if let Some(output) = &args.output {
        let mut out_stats = result.stats.clone();
        out_stats.data_type = GdalDataType::Float64;
        out_stats.band_count = 1;

        write_array::<f64>(output, &out_stats, &result.array, &DEFAULT_GTIFF_OPTIONS)?;
        info!("Wrote {:?}", output);
    }

    Ok(())
}

#[cfg(test)]
mod cmd_read_tests {
    use float_cmp::approx_eq;
    use raster_util::raster::{create_test_raster, get_temp_filename, Raster, RasterLocation};

    use super::*;

    fn test_stats() -> RasterStats {
        RasterStats {
            origin_y: 100.0,
            origin_x: 0.0,
            pixel_height: -10.0,
            pixel_width: 10.0,
            num_rows: 4,
            num_cols: 4,
            band_count: 1,
            no_data_value: Some(-1.0),
            data_type: GdalDataType::Float32,
            projection: "".to_string(),
        }
    }

    #[test]
    fn test_select_window() {
        let stats = test_stats();

        assert_eq!(select_window(&stats, None, None).unwrap(), Window::full(&stats));
        assert_eq!(select_window(&stats, Some("1,1,2,3"), None).unwrap(), Window::new(1, 1, 2, 3));
        assert!(select_window(&stats, Some("3,3,2,2"), None).is_err());
        assert_eq!(select_window(&stats, None, Some("10,60,30,90")).unwrap(), Window::new(1, 1, 2, 3));
        assert!(select_window(&stats, Some("0,0,1,1"), Some("10,60,30,90")).is_err());
    }

    #[test]
    fn test_read_decimated_and_write() {
        let stats = test_stats();
        let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let path = create_test_raster("read.tif", &stats, &data).unwrap();

        let output = get_temp_filename("read_out.tif");

        let args = ReadArgs {
            raster: RasterArgs { raster: RasterLocation::from(path), band: 1 },
            window: Some("0,0,4,2".to_string()),
            bounds: None,
            decimate: 2,
            resample: "nearest".to_string(),
            output: Some(output.clone()),
            clean: false,
        };

        let result = read_band(&args).unwrap();
        assert_eq!(result.array.dim(), (1, 2));
        assert!(approx_eq!(f64, result.stats.pixel_width, 20.0));
        assert!(approx_eq!(f64, result.stats.pixel_height, -20.0));

        run_read(&args).unwrap();

        let written = Raster::read(&output, true).unwrap();
        assert_eq!(written.stats.num_cols, 2);
        assert_eq!(written.stats.num_rows, 1);
        assert_eq!(written.stats.data_type, GdalDataType::Float64);
        assert!(approx_eq!(f64, written.stats.origin_y, 100.0));
    }
}
