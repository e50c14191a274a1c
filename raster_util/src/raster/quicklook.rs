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
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use gdal::DriverManager;
use gdal::raster::Buffer;
use itertools::Itertools;
use log::debug;
use ndarray::Array2;

use crate::raster::IsNoData;

pub const PNG_DRIVER: &str = "PNG";

/// Piecewise linear RGB ramp, stop positions are in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    stops: Vec<(f64, [u8; 3])>,
}

impl ColorMap {
    pub fn new(mut stops: Vec<(f64, [u8; 3])>) -> Result<Self> {
        if stops.len() < 2 {
            bail!("A color map needs at least 2 stops, got {}", stops.len());
        }
        if let Some((pos, _)) = stops.iter().find(|(pos, _)| !(0.0..=1.0).contains(pos)) {
            bail!("Color stop {} is outside of [0, 1]", pos);
        }
        stops.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        Ok(ColorMap { stops })
    }

    /// Brown for bare soil and water through yellow to green for dense vegetation
    pub fn ndvi() -> Self {
        ColorMap {
            stops: vec![
                (0.0, [140, 81, 10]),
                (0.5, [255, 255, 191]),
                (1.0, [26, 152, 80]),
            ]
        }
    }

    pub fn greys() -> Self {
        ColorMap {
            stops: vec![(0.0, [0, 0, 0]), (1.0, [255, 255, 255])]
        }
    }

    /// Color at t, t is clamped to [0, 1]
    pub fn color_at(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        for ((p0, c0), (p1, c1)) in self.stops.iter().tuple_windows() {
            if t <= *p1 {
                let span = p1 - p0;
                let f = if span > 0.0 { ((t - p0) / span).clamp(0.0, 1.0) } else { 1.0 };
                return [lerp(c0[0], c1[0], f), lerp(c0[1], c1[1], f), lerp(c0[2], c1[2], f)];
            }
        }

        self.stops.last().map_or([0, 0, 0], |(_, c)| *c)
    }

    /// Color of value on a ramp stretched over [min, max]
    pub fn map_value(&self, value: f64, min: f64, max: f64) -> [u8; 3] {
        if max > min {
            self.color_at((value - min) / (max - min))
        } else {
            self.color_at(0.5)
        }
    }
}

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}

fn valid_values<T: Copy + IsNoData + Into<f64>>(array: &Array2<T>, nodata: Option<f64>) -> Vec<f64> {
    array.iter()
        .filter(|v| !v.is_value_nodata(nodata))
        .map(|v| (*v).into())
        .filter(|v: &f64| v.is_finite())
        .collect()
}

/// Linear interpolation between the closest ranks, values must be sorted
fn percentile_of_sorted(sorted: &[f64], percent: f64) -> f64 {
    let rank = percent / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// (low, high) percentiles of the valid values, the usual contrast stretch for a preview
pub fn percentile_stretch<T: Copy + IsNoData + Into<f64>>(array: &Array2<T>,
                                                          nodata: Option<f64>,
                                                          low: f64,
                                                          high: f64) -> Result<(f64, f64)> {
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
        bail!("Invalid percentiles {} {}", low, high);
    }

    let mut values = valid_values(array, nodata);
    if values.is_empty() {
        bail!("No valid values to stretch");
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Ok((percentile_of_sorted(&values, low), percentile_of_sorted(&values, high)))
}

/// Red, green, blue and alpha planes in row major order.  Nodata is transparent.
pub fn render_rgba<T: Copy + IsNoData + Into<f64>>(array: &Array2<T>,
                                                   nodata: Option<f64>,
                                                   colormap: &ColorMap,
                                                   min: f64,
                                                   max: f64) -> [Vec<u8>; 4] {
    let len = array.len();
    let mut planes = [Vec::with_capacity(len), Vec::with_capacity(len),
        Vec::with_capacity(len), Vec::with_capacity(len)];

    for v in array.iter() {
        let value: f64 = (*v).into();
        let (rgb, alpha) = if v.is_value_nodata(nodata) || !value.is_finite() {
            ([0, 0, 0], 0)
        } else {
            (colormap.map_value(value, min, max), 255)
        };
        planes[0].push(rgb[0]);
        planes[1].push(rgb[1]);
        planes[2].push(rgb[2]);
        planes[3].push(alpha);
    }

    planes
}

/// Writes RGBA planes as a PNG, the planes are built in memory and copied to the PNG driver
pub fn write_png(path: &Path, planes: &[Vec<u8>; 4], width: usize, height: usize) -> Result<()> {
    for plane in planes.iter() {
        if plane.len() != width * height {
            bail!("Plane of {} pixels does not match {}x{}", plane.len(), width, height);
        }
    }

    let mem_driver = DriverManager::get_driver_by_name("MEM")?;
    let ds = mem_driver.create_with_band_type::<u8, _>("", width as isize, height as isize, 4)?;

    for (band_index, plane) in planes.iter().enumerate() {
        let mut band = ds.rasterband(band_index as isize + 1)?;
        band.write((0, 0), (width, height), &Buffer::new((width, height), plane.clone()))?;
    }

    let png_driver = DriverManager::get_driver_by_name(PNG_DRIVER)?;
    ds.create_copy(&png_driver, path, &[])
        .with_context(|| format!("Unable to write {:?}", path))?;

    debug!("Wrote {}x{} quicklook to {:?}", width, height, path);

    Ok(())
}

/// Renders a band, stretched over [min, max], to a PNG
pub fn write_quicklook<T: Copy + IsNoData + Into<f64>>(path: &Path,
                                                       array: &Array2<T>,
                                                       nodata: Option<f64>,
                                                       colormap: &ColorMap,
                                                       min: f64,
                                                       max: f64) -> Result<()> {
    let (rows, cols) = array.dim();
    let planes = render_rgba(array, nodata, colormap, min, max);
    write_png(path, &planes, cols, rows)
}

/// Equal width bins over [min, max], values outside are counted apart
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<u64>,
    pub outside: u64,
}

const HISTOGRAM_BAR_WIDTH: usize = 40;

impl Histogram {
    pub fn new<I: IntoIterator<Item=f64>>(values: I, bins: usize, min: f64, max: f64) -> Result<Self> {
        if bins == 0 {
            bail!("A histogram needs at least one bin");
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            bail!("Invalid histogram range [{}, {}]", min, max);
        }

        let mut counts = vec![0u64; bins];
        let mut outside = 0;
        let bin_width = (max - min) / bins as f64;

        for v in values {
            if !v.is_finite() || v < min || v > max {
                outside += 1;
                continue;
            }
            //max itself goes in the last bin
            let idx = (((v - min) / bin_width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Ok(Histogram { min, max, counts, outside })
    }

    /// Histogram of the valid values of a band
    pub fn from_array<T: Copy + IsNoData + Into<f64>>(array: &Array2<T>, nodata: Option<f64>, bins: usize, min: f64, max: f64) -> Result<Self> {
        Histogram::new(valid_values(array, nodata), bins, min, max)
    }

    pub fn bin_edges(&self, bin: usize) -> (f64, f64) {
        let bin_width = (self.max - self.min) / self.counts.len() as f64;
        (self.min + bin as f64 * bin_width, self.min + (bin + 1) as f64 * bin_width)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let largest = self.counts.iter().copied().max().unwrap_or(0);

        for (bin, count) in self.counts.iter().enumerate() {
            let (lo, hi) = self.bin_edges(bin);
            let bar_len = if largest == 0 {
                0
            } else {
                (*count as f64 / largest as f64 * HISTOGRAM_BAR_WIDTH as f64).round() as usize
            };
            writeln!(f, "{:>9.3} .. {:>9.3} | {:<width$} {}", lo, hi, "#".repeat(bar_len), count,
                     width = HISTOGRAM_BAR_WIDTH)?;
        }
        if self.outside > 0 {
            writeln!(f, "Outside of range: {}", self.outside)?;
        }
        Ok(())
    }
}
