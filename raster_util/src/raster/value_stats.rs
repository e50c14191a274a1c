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
use std::fmt;

use ndarray::Array2;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::raster::IsNoData;

/// Running count, extremes and sum of the valid values of a band.  Chunks are
/// summarized apart and merged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueStats {
    pub count: u64,
    pub nodata_count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

impl Default for ValueStats {
    fn default() -> Self {
        ValueStats {
            count: 0,
            nodata_count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
        }
    }
}

impl ValueStats {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
    }

    pub fn merge(mut self, other: ValueStats) -> ValueStats {
        self.count += other.count;
        self.nodata_count += other.nodata_count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self
    }

    pub fn from_array<T>(array: &Array2<T>, nodata: Option<f64>) -> ValueStats
        where T: Copy + IsNoData + Into<f64> + Sync
    {
        array.par_iter().fold(ValueStats::default, |mut acc, &v| {
            if v.is_value_nodata(nodata) {
                acc.nodata_count += 1;
            } else {
                acc.add(v.into());
            }
            acc
        }).reduce(ValueStats::default, ValueStats::merge)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

impl fmt::Display for ValueStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mean() {
            Some(mean) => write!(f, "Valid pixels: {}  Nodata pixels: {}\nMin: {:.4}  Max: {:.4}  Mean: {:.4}",
                                 self.count, self.nodata_count, self.min, self.max, mean),
            None => write!(f, "Valid pixels: 0  Nodata pixels: {}", self.nodata_count),
        }
    }
}
