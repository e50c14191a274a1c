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
use core::fmt;
use anyhow::{bail, Result};
use float_cmp::{ApproxEq, F64Margin};
use gdal::Dataset;
use gdal::raster::{GdalDataType, RasterBand};
use log::warn;
use serde::Serialize;

use crate::raster::{is_nodata, is_nodata_f64};

/// The flat metadata record of a raster, what gets copied and tweaked before
/// writing a derived raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStats {
    pub origin_y: f64,
    pub origin_x: f64,
    pub pixel_height: f64,
    pub pixel_width: f64,
    pub num_rows: u32,
    pub num_cols: u32,
    pub band_count: u32,
    pub no_data_value: Option<f64>,
    pub data_type: GdalDataType,

    //WKT projection string
    pub projection: String
}

pub const MEDIUM_EPSILON: f64 = 1e-10;

// In lat/lon this is less than a meter
pub const LARGE_EPSILON: f64 = 1e-6;

fn within_eps(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

impl fmt::Display for RasterStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (left, bottom, right, top) = self.bounds();
        let no_data = match self.no_data_value {
            Some(nd) => nd.to_string(),
            None => "None".to_string(),
        };

        write!(f, "Origin X,Y: {}, {}\nBounds (l,b,r,t): {}, {}, {}, {}\nPixel Width/Height: {},{}\nRows: {} Cols: {} Bands: {}\nNo data value: {}\nData Type: {:?}\nProjection: {}",
               self.origin_x,
               self.origin_y,
               left, bottom, right, top,
               self.pixel_width,
               self.pixel_height,
               self.num_rows,
               self.num_cols,
               self.band_count,
               no_data,
               self.data_type,
               &self.projection
        )
    }
}

impl RasterStats {

    pub fn new(dataset: &Dataset, band: &RasterBand) -> Self {

        let geotransform = match dataset.geo_transform() {
            Ok(gt) => gt,
            Err(e) => {
                warn!("No geo transform ({}), using pixel coordinates", e);
                [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
            }
        };

        if geotransform[2] != 0.0 || geotransform[4] != 0.0 {
            warn!("Rotated geo transform {:?}, rotation terms are ignored", geotransform);
        }

        let (num_cols, num_rows) = band.size();

        RasterStats {
            origin_x: geotransform[0],
            pixel_width: geotransform[1],
            origin_y: geotransform[3],
            pixel_height: geotransform[5],
            num_cols: num_cols as u32,
            num_rows: num_rows as u32,
            band_count: dataset.raster_count() as u32,
            no_data_value: band.no_data_value(),
            data_type: band.band_type(),
            projection: dataset.projection(),
        }
    }

    pub fn geo_transform(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, 0.0, self.origin_y, 0.0, self.pixel_height]
    }

    pub fn calc_center(&self, raster_xy: (i64, i64)) -> [f64; 2] {
        [self.origin_x + self.pixel_width * (raster_xy.0 as f64 + 0.5),
         self.origin_y + self.pixel_height * (raster_xy.1 as f64 + 0.5)]
    }

    /// Calculates projected x coordinate of the left side of column raster_x
    pub fn calc_x_coord(&self, raster_x: i64) -> f64 {
        self.origin_x + self.pixel_width * raster_x as f64
    }
    pub fn right_x_coord(&self) -> f64 {
        self.calc_x_coord(self.num_cols as i64)
    }
    ///calculates the top side
    /// Note pixel height is negative for north up rasters
    pub fn calc_y_coord(&self, raster_y: i64) -> f64 {
        self.origin_y + self.pixel_height * raster_y as f64
    }
    pub fn bottom_y_coord(&self) -> f64 {
        self.calc_y_coord(self.num_rows as i64)
    }

    //Converts projected coordinate to raster_x
    pub fn calc_x(&self, x_coord: f64) -> i64 {
        ((x_coord - self.origin_x) / self.pixel_width).floor() as _
    }
    pub fn calc_y(&self, y_coord: f64) -> i64 {
        ((y_coord - self.origin_y) / self.pixel_height).floor() as _
    }

    pub fn bounds_x(&self, raster_x: i64) -> i64 {
        raster_x.max(0).min(self.num_cols as i64 - 1)
    }

    pub fn bounds_y(&self, raster_y: i64) -> i64 {
        raster_y.max(0).min(self.num_rows as i64 - 1)
    }

    pub fn contains_pixel(&self, raster_x: i64, raster_y: i64) -> bool {
        raster_x >= 0 && raster_y >= 0 &&
            raster_x < self.num_cols as i64 && raster_y < self.num_rows as i64
    }

    /// (left, bottom, right, top)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let x1 = self.origin_x;
        let x2 = self.right_x_coord();
        let y1 = self.origin_y;
        let y2 = self.bottom_y_coord();

        (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
    }

    /// Record of the sub raster starting at (col_off, row_off)
    pub fn for_window(&self, col_off: u32, row_off: u32, width: u32, height: u32) -> Self {
        let mut stats = self.clone();
        stats.origin_x = self.calc_x_coord(col_off as i64);
        stats.origin_y = self.calc_y_coord(row_off as i64);
        stats.num_cols = width;
        stats.num_rows = height;
        stats
    }

    /// Record of this raster read back at 1/factor of its resolution
    pub fn decimated(&self, factor: u32) -> Result<Self> {
        if factor == 0 {
            bail!("Decimation factor must be at least 1");
        }

        let num_cols = num::Integer::div_ceil(&self.num_cols, &factor);
        let num_rows = num::Integer::div_ceil(&self.num_rows, &factor);

        Ok(self.resized(num_cols, num_rows))
    }

    /// Same extent, different number of pixels
    pub fn resized(&self, num_cols: u32, num_rows: u32) -> Self {
        let mut stats = self.clone();
        stats.pixel_width = self.pixel_width * self.num_cols as f64 / num_cols as f64;
        stats.pixel_height = self.pixel_height * self.num_rows as f64 / num_rows as f64;
        stats.num_cols = num_cols;
        stats.num_rows = num_rows;
        stats
    }

    pub fn check_same_grid(&self, rhs: &Self) -> Result<()> {

        if self.num_cols != rhs.num_cols || self.num_rows != rhs.num_rows {
            bail!("Raster sizes differ: {}x{} vs {}x{}",
                  self.num_cols, self.num_rows, rhs.num_cols, rhs.num_rows);
        }

        if !within_eps(self.origin_x, rhs.origin_x, LARGE_EPSILON) ||
            !within_eps(self.origin_y, rhs.origin_y, LARGE_EPSILON) {
            bail!("Raster origins differ: {},{} vs {},{}",
                  self.origin_x, self.origin_y, rhs.origin_x, rhs.origin_y);
        }

        if !within_eps(self.pixel_width, rhs.pixel_width, MEDIUM_EPSILON) ||
            !within_eps(self.pixel_height, rhs.pixel_height, MEDIUM_EPSILON) {
            bail!("Pixel sizes differ: {}x{} vs {}x{}",
                  self.pixel_width, self.pixel_height, rhs.pixel_width, rhs.pixel_height);
        }

        Ok(())
    }

    /// True when both grids share projection and pixel size and their origins are a
    /// whole number of pixels apart
    pub fn is_aligned(&self, rhs: &Self) -> bool {

        if self.projection != rhs.projection {
            return false;
        }

        if !within_eps(self.pixel_height, rhs.pixel_height, MEDIUM_EPSILON) ||
            !within_eps(self.pixel_width, rhs.pixel_width, MEDIUM_EPSILON) {
            return false;
        }

        let ox_diff = (self.origin_x - rhs.origin_x) / self.pixel_width;
        let oy_diff = (self.origin_y - rhs.origin_y) / self.pixel_height;

        let margin = F64Margin { epsilon: LARGE_EPSILON, ulps: 0 };

        (ox_diff.round() - ox_diff).approx_eq(0.0, margin) &&
            (oy_diff.round() - oy_diff).approx_eq(0.0, margin)
    }

    //Shortcut when dealing with f64 values & nodata.  Handles f32 case
    pub fn is_nodata(&self, in_value: f64) -> bool {
        let no_data_value = match self.no_data_value {
            Some(nd) => nd,
            None => return !in_value.is_finite(),
        };

        if is_nodata_f64(in_value, no_data_value) {
            return true;
        }
        //A f32 rounding error is much bigger than the ulps of a f64
        self.data_type == GdalDataType::Float32 && is_nodata(in_value as f32, no_data_value as f32)
    }

    pub fn summary(&self) -> RasterSummary {
        let (left, bottom, right, top) = self.bounds();
        RasterSummary {
            width: self.num_cols,
            height: self.num_rows,
            count: self.band_count,
            dtype: format!("{:?}", self.data_type),
            nodata: self.no_data_value,
            transform: self.geo_transform(),
            bounds: [left, bottom, right, top],
            crs: self.projection.clone(),
        }
    }
}

/// Serializable view of a RasterStats, named the way profiles usually are
#[derive(Debug, Serialize)]
pub struct RasterSummary {
    pub width: u32,
    pub height: u32,
    pub count: u32,
    pub dtype: String,
    pub nodata: Option<f64>,
    pub transform: [f64; 6],
    pub bounds: [f64; 4],
    pub crs: String,
}

#[cfg(test)]
pub(crate) fn sample_stats() -> RasterStats {
    RasterStats {
        origin_x: 4.0,
        origin_y: 5.0,
        pixel_height: -2.0,
        pixel_width: 1.0,
        num_rows: 4,
        num_cols: 5,
        band_count: 1,
        no_data_value: Some(3.2),
        data_type: GdalDataType::Float32,
        projection: "".to_string()
    }
}
