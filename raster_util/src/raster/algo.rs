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
use std::fs::create_dir_all;
use std::path::Path;

use anyhow::{bail, Context, Result};
use float_cmp::{ApproxEq, F32Margin, F64Margin};
use gdal::{Dataset, DriverManager};
use gdal::raster::{Buffer, GdalType, RasterBand, RasterCreationOption};
use log::debug;
use ndarray::Array2;
use num::NumCast;

use crate::raster::RasterStats;

pub const GTIFF_DRIVER: &str = "GTiff";

pub const DEFAULT_GTIFF_OPTIONS: [RasterCreationOption<'static>; 3] = [
    RasterCreationOption { key: "COMPRESS", value: "DEFLATE" },
    RasterCreationOption { key: "TILED", value: "YES" },
    RasterCreationOption { key: "BIGTIFF", value: "IF_SAFER" },
];

/// Creates a GeoTIFF with the size, band count, transform, projection and nodata of
/// the record and returns it opened for writing
pub fn create_empty_raster<T: GdalType + Copy + NumCast>(raster_path: &Path,
                                                         stats: &RasterStats,
                                                         fill_with_nodata: bool,
                                                         create_options: &[RasterCreationOption],
) -> Result<Dataset>
{
    debug!("Creating output tif {:?}", &raster_path);

    if let Some(a) = raster_path.parent() {
        if !a.as_os_str().is_empty() && !a.exists() {
            create_dir_all(a)?;
        }
    }

    let drv = DriverManager::get_driver_by_name(GTIFF_DRIVER)?;

    let mut ds = drv.create_with_band_type_with_options::<T, _>(
        raster_path,
        stats.num_cols as isize,
        stats.num_rows as isize,
        stats.band_count.max(1) as isize,
        create_options,
    ).with_context(|| format!("Unable to create {:?}", raster_path))?;

    ds.set_geo_transform(&stats.geo_transform())?;

    if !stats.projection.is_empty() {
        ds.set_projection(&stats.projection)?;
    }

    if let Some(no_data_value) = stats.no_data_value {
        debug!("Setting output No data value to {}", no_data_value);
        for band_index in 1..=stats.band_count.max(1) {
            let mut band = ds.rasterband(band_index as isize)?;
            band.set_no_data_value(Some(no_data_value))?;
            if fill_with_nodata {
                fill_band::<T>(&mut band, no_data_value)?;
            }
        }
    }

    Ok(ds)
}

/// Writes value to every pixel, one strip of block rows at a time
pub fn fill_band<T: GdalType + Copy + NumCast>(band: &mut RasterBand, value: f64) -> Result<()> {
    let fill_value: T = match NumCast::from(value) {
        Some(v) => v,
        None => bail!("{} does not fit the band type", value),
    };

    let (num_cols, num_rows) = band.size();
    let strip_rows = band.block_size().1.max(1).min(num_rows.max(1));

    let mut row_off = 0;
    while row_off < num_rows {
        let rows = strip_rows.min(num_rows - row_off);
        let buffer = Buffer::new((num_cols, rows), vec![fill_value; num_cols * rows]);
        band.write((0, row_off as isize), (num_cols, rows), &buffer)?;
        row_off += rows;
    }

    Ok(())
}

/// Writes a (rows, cols) array as a new single band raster described by stats
pub fn write_array<T: GdalType + Copy + NumCast>(raster_path: &Path,
                                       stats: &RasterStats,
                                       array: &Array2<T>,
                                       create_options: &[RasterCreationOption],
) -> Result<()>
{
    let (rows, cols) = array.dim();

    if rows != stats.num_rows as usize || cols != stats.num_cols as usize {
        bail!("Array of shape {}x{} does not match raster of {} rows and {} cols",
              rows, cols, stats.num_rows, stats.num_cols);
    }

    let mut single_band = stats.clone();
    single_band.band_count = 1;

    let ds = create_empty_raster::<T>(raster_path, &single_band, false, create_options)?;
    let mut band = ds.rasterband(1)?;

    let data: Vec<T> = array.iter().copied().collect();
    let buffer = Buffer::new((cols, rows), data);

    band.write((0, 0), (cols, rows), &buffer)?;

    debug!("Wrote {}x{} pixels to {:?}", cols, rows, raster_path);

    Ok(())
}

#[inline]
pub fn is_nodata(val: f32, no_data_value: f32) -> bool {

    //Gdal can read nodata values as NaN
    if !val.is_finite() {
        return true;
    }

    if !no_data_value.is_finite() {
        return false;
    }

    no_data_value.approx_eq(val, F32Margin { ulps: 5, epsilon: f32::EPSILON * 5.0 })
}

#[inline]
pub fn is_nodata_f64(val: f64, no_data_value: f64) -> bool {

    if !val.is_finite() {
        return true;
    }

    if !no_data_value.is_finite() {
        return false;
    }

    no_data_value.approx_eq(val, F64Margin { ulps: 5, epsilon: f64::EPSILON * 5.0 })
}

pub trait IsNoData {
    fn is_value_nodata(self, no_data_val: Option<f64>) -> bool;
}

impl IsNoData for f32 {
    fn is_value_nodata(self, no_data_val: Option<f64>) -> bool {
        match no_data_val {
            Some(nd) => is_nodata(self, nd as f32),
            None => !self.is_finite(),
        }
    }
}

impl IsNoData for f64 {
    fn is_value_nodata(self, no_data_val: Option<f64>) -> bool {
        match no_data_val {
            Some(nd) => is_nodata_f64(self, nd),
            None => !self.is_finite(),
        }
    }
}

macro_rules! impl_is_nodata_int {
    ($($t:ty),*) => {
        $(
            impl IsNoData for $t {
                fn is_value_nodata(self, no_data_val: Option<f64>) -> bool {
                    no_data_val.map_or(false, |nd| self as f64 == nd)
                }
            }
        )*
    }
}

impl_is_nodata_int!(u8, u16, i16, u32, i32);

#[cfg(test)]
mod test {
    use super::*;
    use crate::raster::{get_temp_filename, Raster};
    use crate::raster::raster_stats::sample_stats;
    use gdal::raster::GdalDataType;

    #[test]
    fn test_create_filled_with_nodata() {
        let stats = RasterStats {
            num_rows: 300,
            num_cols: 7,
            band_count: 2,
            no_data_value: Some(-9999.0),
            ..sample_stats()
        };

        let path = get_temp_filename("filled.tif");
        {
            let _ds = create_empty_raster::<f32>(&path, &stats, true, &DEFAULT_GTIFF_OPTIONS).unwrap();
        }

        let raster = Raster::read(&path, true).unwrap();
        for band_index in 1..=2 {
            let data = raster.band(band_index).unwrap().read_band_as::<f32>().unwrap().data;
            assert_eq!(data.len(), 300 * 7);
            assert!(data.iter().all(|v| *v == -9999.0));
        }

        let int_stats = RasterStats {
            no_data_value: Some(65535.0),
            data_type: GdalDataType::UInt16,
            ..sample_stats()
        };
        let int_path = get_temp_filename("filled_u16.tif");
        {
            let _ds = create_empty_raster::<u16>(&int_path, &int_stats, true, &DEFAULT_GTIFF_OPTIONS).unwrap();
        }
        let data = Raster::read(&int_path, true).unwrap().band(1).unwrap().read_band_as::<u16>().unwrap().data;
        assert!(data.iter().all(|v| *v == 65535));

        //nodata that the band type cannot hold
        let bad_stats = RasterStats { no_data_value: Some(-1.0), ..int_stats };
        assert!(create_empty_raster::<u16>(&get_temp_filename("bad.tif"), &bad_stats, true, &DEFAULT_GTIFF_OPTIONS).is_err());
    }

    #[test]
    fn test_is_nodata() {
        let nodata = f32::MIN;

        assert!(is_nodata(nodata + 10000., nodata));
        assert!(is_nodata(f32::NAN, nodata));
        assert!(is_nodata(f32::INFINITY, nodata));

        assert!(!is_nodata(nodata + 1e34, nodata));

        let nodata = f32::NAN;

        assert!(is_nodata(f32::NAN, nodata));
        assert!(!is_nodata(1e30, nodata));
    }

    #[test]
    fn test_is_nodata_64() {
        let nodata = -9999.0;

        assert!(is_nodata_f64(-9999.0, nodata));
        assert!(!is_nodata_f64(-9998.0, nodata));
        assert!(is_nodata_f64(f64::NAN, nodata));

        let nodata = f64::NAN;

        assert!(is_nodata_f64(f64::NAN, nodata));
        assert!(!is_nodata_f64(1e306, nodata));
    }

    #[test]
    fn test_is_value_nodata() {
        assert!(0u16.is_value_nodata(Some(0.0)));
        assert!(!1u16.is_value_nodata(Some(0.0)));
        assert!(!0u16.is_value_nodata(None));

        assert!((-9999.0f32).is_value_nodata(Some(-9999.0)));
        assert!(f32::NAN.is_value_nodata(None));
        assert!(!0.5f64.is_value_nodata(None));
    }
}
