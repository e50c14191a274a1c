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
use anyhow::{bail, Result};
use gdal::raster::{GdalType, RasterBand, ResampleAlg};
use log::debug;
use ndarray::Array2;

use crate::raster::RasterStats;

/// A rectangular block of pixels, in column / row offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: u32,
    pub row_off: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    pub fn new(col_off: u32, row_off: u32, width: u32, height: u32) -> Self {
        Window { col_off, row_off, width, height }
    }

    pub fn full(stats: &RasterStats) -> Self {
        Window::new(0, 0, stats.num_cols, stats.num_rows)
    }

    /// Smallest window covering the projected bounds, clipped to the raster
    pub fn from_bounds(stats: &RasterStats, left: f64, bottom: f64, right: f64, top: f64) -> Result<Self> {
        if left >= right || bottom >= top {
            bail!("Invalid bounds: left {} bottom {} right {} top {}", left, bottom, right, top);
        }

        //pixel space, pixel height is usually negative so top maps to the first row
        let cols = [(left - stats.origin_x) / stats.pixel_width,
            (right - stats.origin_x) / stats.pixel_width];
        let rows = [(top - stats.origin_y) / stats.pixel_height,
            (bottom - stats.origin_y) / stats.pixel_height];

        let col_start = cols[0].min(cols[1]).floor() as i64;
        let col_stop = cols[0].max(cols[1]).ceil() as i64;
        let row_start = rows[0].min(rows[1]).floor() as i64;
        let row_stop = rows[0].max(rows[1]).ceil() as i64;

        Window::clipped(stats, col_start, row_start, col_stop, row_stop)
    }

    /// Clips [col_start, col_stop) x [row_start, row_stop) to the raster
    pub fn clipped(stats: &RasterStats, col_start: i64, row_start: i64, col_stop: i64, row_stop: i64) -> Result<Self> {
        let c0 = col_start.max(0);
        let r0 = row_start.max(0);
        let c1 = col_stop.min(stats.num_cols as i64);
        let r1 = row_stop.min(stats.num_rows as i64);

        if c1 <= c0 || r1 <= r0 {
            bail!("Window cols {}..{} rows {}..{} does not intersect the {}x{} raster",
                  col_start, col_stop, row_start, row_stop, stats.num_cols, stats.num_rows);
        }

        Ok(Window::new(c0 as u32, r0 as u32, (c1 - c0) as u32, (r1 - r0) as u32))
    }

    /// Part of the window inside the raster
    pub fn intersect_raster(&self, stats: &RasterStats) -> Result<Self> {
        Window::clipped(stats,
                        self.col_off as i64, self.row_off as i64,
                        self.col_off as i64 + self.width as i64,
                        self.row_off as i64 + self.height as i64)
    }

    /// Checks the window is not empty and lies within the raster
    pub fn validate(&self, stats: &RasterStats) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("Empty window {:?}", self);
        }
        if self.col_off as u64 + self.width as u64 > stats.num_cols as u64 ||
            self.row_off as u64 + self.height as u64 > stats.num_rows as u64 {
            bail!("Window {:?} extends past the {}x{} raster", self, stats.num_cols, stats.num_rows);
        }
        Ok(())
    }

    pub fn offset(&self) -> (isize, isize) {
        (self.col_off as isize, self.row_off as isize)
    }

    /// (cols, rows) as GDAL wants it
    pub fn size(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }

    /// Record of the pixels covered by this window
    pub fn stats(&self, stats: &RasterStats) -> RasterStats {
        stats.for_window(self.col_off, self.row_off, self.width, self.height)
    }
}

/// (rows, cols) of a window read at 1/factor resolution
pub fn decimated_shape(window: &Window, factor: u32) -> Result<(usize, usize)> {
    if factor == 0 {
        bail!("Decimation factor must be at least 1");
    }
    Ok((num::Integer::div_ceil(&window.height, &factor) as usize,
        num::Integer::div_ceil(&window.width, &factor) as usize))
}

pub fn read_window<T: Copy + GdalType>(band: &RasterBand, stats: &RasterStats, window: &Window) -> Result<Array2<T>> {
    let out_shape = (window.height as usize, window.width as usize);
    read_decimated(band, stats, window, out_shape, None)
}

/// Reads the window resampled into an array of out_shape (rows, cols).  GDAL
/// picks a matching overview level when the band has one.
pub fn read_decimated<T: Copy + GdalType>(band: &RasterBand,
                                          stats: &RasterStats,
                                          window: &Window,
                                          out_shape: (usize, usize),
                                          resample: Option<ResampleAlg>) -> Result<Array2<T>> {
    window.validate(stats)?;

    let (rows, cols) = out_shape;
    if rows == 0 || cols == 0 {
        bail!("Output shape {:?} is empty", out_shape);
    }

    debug!("Reading window {:?} into {}x{} (rows x cols)", window, rows, cols);

    let array = band.read_as_array::<T>(window.offset(), window.size(), (cols, rows), resample)?;

    Ok(array)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewInfo {
    pub index: usize,
    pub width: usize,
    pub height: usize,
    //decimation relative to the full resolution band
    pub factor: usize,
}

pub fn overview_factor(band_width: usize, overview_width: usize) -> usize {
    if overview_width == 0 {
        return 0;
    }
    (band_width as f64 / overview_width as f64).round() as usize
}

pub fn list_overviews(band: &RasterBand) -> Result<Vec<OverviewInfo>> {
    let count = band.overview_count()?;
    let band_width = band.x_size();

    let mut overviews = Vec::with_capacity(count.max(0) as usize);

    for index in 0..count.max(0) as usize {
        let overview = band.overview(index as isize)?;
        let (width, height) = overview.size();
        overviews.push(OverviewInfo {
            index,
            width,
            height,
            factor: overview_factor(band_width, width),
        });
    }

    Ok(overviews)
}

/// Whole overview level as (rows, cols)
pub fn read_overview<T: Copy + GdalType>(band: &RasterBand, index: usize) -> Result<Array2<T>> {
    let count = band.overview_count()?.max(0) as usize;
    if index >= count {
        bail!("Overview {} requested but the band has {} overviews", index, count);
    }

    let overview = band.overview(index as isize)?;
    let size = overview.size();

    Ok(overview.read_as_array::<T>((0, 0), size, size, None)?)
}

pub fn parse_resample(name: &str) -> Result<ResampleAlg> {
    let alg = match name.to_lowercase().as_str() {
        "nearest" => ResampleAlg::NearestNeighbour,
        "bilinear" => ResampleAlg::Bilinear,
        "cubic" => ResampleAlg::Cubic,
        "cubicspline" => ResampleAlg::CubicSpline,
        "lanczos" => ResampleAlg::Lanczos,
        "average" => ResampleAlg::Average,
        "mode" => ResampleAlg::Mode,
        "gauss" => ResampleAlg::Gauss,
        _ => bail!("Unknown resampling method {:?}", name),
    };
    Ok(alg)
}

/// Name as understood by gdalwarp -r
pub fn resample_name(alg: ResampleAlg) -> &'static str {
    match alg {
        ResampleAlg::NearestNeighbour => "near",
        ResampleAlg::Bilinear => "bilinear",
        ResampleAlg::Cubic => "cubic",
        ResampleAlg::CubicSpline => "cubicspline",
        ResampleAlg::Lanczos => "lanczos",
        ResampleAlg::Average => "average",
        ResampleAlg::Mode => "mode",
        ResampleAlg::Gauss => "gauss",
    }
}

#[cfg(test)]
mod read_tests {
    use super::*;
    use crate::raster::raster_stats::sample_stats;
    use crate::raster::{create_test_raster, Raster};

    #[test]
    fn test_from_bounds() {
        //origin 4,5  pixel 1 x -2, 5 cols 4 rows => x 4..9, y -3..5
        let stats = sample_stats();

        let w = Window::from_bounds(&stats, 5.0, 0.0, 7.0, 3.0).unwrap();
        assert_eq!(w, Window::new(1, 1, 2, 2));

        //partial pixels are included
        let w = Window::from_bounds(&stats, 5.5, 1.5, 6.2, 4.5).unwrap();
        assert_eq!(w, Window::new(1, 0, 2, 2));

        //clipped to the raster
        let w = Window::from_bounds(&stats, 0.0, -100.0, 100.0, 100.0).unwrap();
        assert_eq!(w, Window::full(&stats));

        assert!(Window::from_bounds(&stats, 20.0, 0.0, 30.0, 3.0).is_err());
        assert!(Window::from_bounds(&stats, 7.0, 0.0, 5.0, 3.0).is_err());
    }

    #[test]
    fn test_validate() {
        let stats = sample_stats();
        assert!(Window::new(0, 0, 5, 4).validate(&stats).is_ok());
        assert!(Window::new(1, 0, 5, 4).validate(&stats).is_err());
        assert!(Window::new(0, 0, 0, 4).validate(&stats).is_err());

        assert_eq!(Window::new(3, 2, 10, 10).intersect_raster(&stats).unwrap(), Window::new(3, 2, 2, 2));
        assert!(Window::new(5, 0, 2, 2).intersect_raster(&stats).is_err());
    }

    #[test]
    fn test_decimated_shape() {
        let w = Window::new(0, 0, 7801, 7691);
        assert_eq!(decimated_shape(&w, 1).unwrap(), (7691, 7801));
        assert_eq!(decimated_shape(&w, 4).unwrap(), (1923, 1951));
        assert!(decimated_shape(&w, 0).is_err());
    }

    #[test]
    fn test_overview_factor() {
        assert_eq!(overview_factor(7801, 3901), 2);
        assert_eq!(overview_factor(7801, 976), 8);
        assert_eq!(overview_factor(100, 0), 0);
    }

    #[test]
    fn test_parse_resample() {
        assert!(matches!(parse_resample("Bilinear").unwrap(), ResampleAlg::Bilinear));
        assert_eq!(resample_name(parse_resample("nearest").unwrap()), "near");
        assert!(parse_resample("magic").is_err());
    }

    #[test]
    fn test_build_list_and_read_overviews() {
        let mut stats = sample_stats();
        stats.num_rows = 8;
        stats.num_cols = 8;

        let data = vec![7.0f32; 64];
        let path = create_test_raster("overviews.tif", &stats, &data).unwrap();

        let mut raster = Raster::read(&path, false).unwrap();
        raster.dataset.build_overviews("NEAREST", &[2, 4], &[]).unwrap();

        let band = raster.band(1).unwrap();
        let overviews = list_overviews(&band).unwrap();
        assert_eq!(overviews.iter().map(|o| o.factor).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(overviews.iter().map(|o| o.width).collect::<Vec<_>>(), vec![4, 2]);
        assert_eq!(overviews[1].height, 2);

        let level = read_overview::<f32>(&band, 1).unwrap();
        assert_eq!(level.dim(), (2, 2));
        assert!(level.iter().all(|v| *v == 7.0));

        assert!(read_overview::<f32>(&band, 5).is_err());
    }
}
