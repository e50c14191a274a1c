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
use gdal::raster::GdalDataType;
use structopt::StructOpt;

use raster_util::raster::{parse_resample, warp_to_crs, Raster, RasterLocation, RasterStats, DEFAULT_GTIFF_OPTIONS};

#[derive(StructOpt)]
pub struct WarpArgs {
    #[structopt(help = "Raster path, http(s)/s3/gs URL or GDAL /vsi path")]
    raster: RasterLocation,

    #[structopt(long, help = "Target CRS, EPSG:xxxx, WKT or proj string")]
    dst_crs: String,

    #[structopt(long, parse(from_os_str))]
    output: PathBuf,

    #[structopt(long, default_value = "nearest")]
    resample: String,

    #[structopt(long)]
    clean: bool,
}

/// Warps keeping the data type of the first band
pub fn warp_raster(args: &WarpArgs) -> Result<Option<RasterStats>> {

    if args.clean && args.output.exists() {
        remove_file(&args.output)?;
    }

    if args.output.exists() {
        println!("{:?} already exists and --clean not passed, doing nothing", &args.output);
        return Ok(None);
    }

    let src = Raster::open(&args.raster, true)?;
    let resample = parse_resample(&args.resample)?;
    let options = &DEFAULT_GTIFF_OPTIONS;

    let grid = match src.stats.data_type {
        GdalDataType::UInt8 => warp_to_crs::<u8>(&src, &args.dst_crs, &args.output, resample, options),
        GdalDataType::UInt16 => warp_to_crs::<u16>(&src, &args.dst_crs, &args.output, resample, options),
        GdalDataType::Int16 => warp_to_crs::<i16>(&src, &args.dst_crs, &args.output, resample, options),
        GdalDataType::UInt32 => warp_to_crs::<u32>(&src, &args.dst_crs, &args.output, resample, options),
        GdalDataType::Int32 => warp_to_crs::<i32>(&src, &args.dst_crs, &args.output, resample, options),
        GdalDataType::Float32 => warp_to_crs::<f32>(&src, &args.dst_crs, &args.output, resample, options),
        _ => warp_to_crs::<f64>(&src, &args.dst_crs, &args.output, resample, options),
    }?;

    Ok(Some(grid))
}

pub fn run_warp(args: &WarpArgs) -> Result<()> {
    if let Some(grid) = warp_raster(args)? {
        println!("Warped {} to {:?}\n{}", args.raster, &args.output, grid);
    }
    Ok(())
}

#[cfg(test)]
mod cmd_warp_tests {
    use gdal::spatial_ref::SpatialRef;
    use raster_util::raster::{create_test_raster, get_temp_filename};

    use super::*;

    #[test]
    fn test_warp_utm_to_wgs84() {
        let srs = SpatialRef::from_epsg(32633).unwrap();

        let stats = RasterStats {
            origin_y: 5_000_000.0,
            origin_x: 500_000.0,
            pixel_height: -100.0,
            pixel_width: 100.0,
            num_rows: 10,
            num_cols: 10,
            band_count: 1,
            no_data_value: Some(0.0),
            data_type: GdalDataType::UInt16,
            projection: srs.to_wkt().unwrap(),
        };

        let data: Vec<u16> = vec![7; 100];
        let path = create_test_raster("utm.tif", &stats, &data).unwrap();

        let output = get_temp_filename("wgs84.tif");

        let args = WarpArgs {
            raster: RasterLocation::from(path),
            dst_crs: "EPSG:4326".to_string(),
            output: output.clone(),
            resample: "nearest".to_string(),
            clean: false,
        };

        let grid = warp_raster(&args).unwrap().unwrap();
        assert_eq!(grid.num_cols, 10);

        let warped = Raster::read(&output, true).unwrap();
        assert_eq!(warped.stats.data_type, GdalDataType::UInt16);
        assert_eq!(warped.stats.no_data_value, Some(0.0));
        assert!(warped.stats.origin_x > 14.9 && warped.stats.origin_x < 15.1);

        let values = warped.band(1).unwrap().read_band_as::<u16>().unwrap().data;
        assert!(values.iter().any(|v| *v == 7));
        assert!(values.iter().all(|v| *v == 7 || *v == 0));
    }
}
