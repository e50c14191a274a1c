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
use itertools::Itertools;
use serde::Serialize;
use structopt::StructOpt;

use raster_util::raster::{Raster, RasterLocation, RasterSummary};

#[derive(StructOpt)]
pub struct InfoArgs {
    #[structopt(help = "Raster path, http(s)/s3/gs URL or GDAL /vsi path")]
    raster: RasterLocation,

    #[structopt(long, help = "Print the profile as JSON")]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct BandInfo {
    pub band: usize,
    pub dtype: String,
    pub nodata: Option<f64>,
    pub block_size: (usize, usize),
    pub overview_count: i32,
}

#[derive(Debug, Serialize)]
pub struct RasterInfo {
    pub location: String,
    pub driver: String,
    pub profile: RasterSummary,
    pub bands: Vec<BandInfo>,
}

pub fn raster_info(raster: &Raster) -> Result<RasterInfo> {
    let mut bands = Vec::new();

    for band_index in 1..=raster.stats.band_count as usize {
        let band = raster.band(band_index)?;
        bands.push(BandInfo {
            band: band_index,
            dtype: format!("{:?}", band.band_type()),
            nodata: band.no_data_value(),
            block_size: band.block_size(),
            overview_count: band.overview_count()?,
        });
    }

    Ok(RasterInfo {
        location: raster.location.to_string(),
        driver: raster.driver_name(),
        profile: raster.stats.summary(),
        bands,
    })
}

pub fn print_info(args: &InfoArgs) -> Result<()> {
    let raster = Raster::open(&args.raster, true)?;
    let info = raster_info(&raster)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info.location);
    println!("Driver: {}", info.driver);
    println!("Size: {} cols x {} rows, {} bands", info.profile.width, info.profile.height, info.profile.count);
    println!("Band types: {}", info.bands.iter().map(|b| &b.dtype).join(", "));
    println!("\n{}\n", raster.stats);

    for b in info.bands.iter() {
        let nodata = b.nodata.map_or("None".to_string(), |nd| nd.to_string());
        println!("Band {}: {} nodata {} block {}x{} overviews {}",
                 b.band, b.dtype, nodata, b.block_size.0, b.block_size.1, b.overview_count);
    }

    Ok(())
}

#[cfg(test)]
mod cmd_info_tests {
    use raster_util::raster::{create_test_multiband_raster, RasterStats};
    use gdal::raster::GdalDataType;

    use super::*;

    #[test]
    fn test_info() {
        let stats = RasterStats {
            origin_y: 45.0,
            origin_x: 6.0,
            pixel_height: -0.5,
            pixel_width: 0.5,
            num_rows: 3,
            num_cols: 2,
            band_count: 2,
            no_data_value: Some(0.0),
            data_type: GdalDataType::UInt16,
            projection: "".to_string(),
        };

        let b1: Vec<u16> = vec![1, 2, 3, 4, 5, 6];
        let b2: Vec<u16> = vec![6, 5, 4, 3, 2, 1];
        let path = create_test_multiband_raster("info.tif", &stats, &[&b1, &b2]).unwrap();

        let raster = Raster::read(&path, true).unwrap();
        let info = raster_info(&raster).unwrap();

        assert_eq!(info.driver, "GTiff");
        assert_eq!(info.bands.len(), 2);
        assert_eq!(info.bands[1].nodata, Some(0.0));
        assert_eq!(info.bands[0].overview_count, 0);

        let json: serde_json::Value = serde_json::to_value(&info).unwrap();
        assert_eq!(json["profile"]["width"], 2);
        assert_eq!(json["profile"]["count"], 2);
        assert_eq!(json["profile"]["bounds"][1], 43.5);
    }
}
