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
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use gdal::raster::{Buffer, GdalType};
use num::NumCast;
use uuid::Uuid;

use crate::raster::{create_empty_raster, RasterStats, DEFAULT_GTIFF_OPTIONS};

/// A not yet existing path in its own folder under the temp dir
pub fn get_temp_filename(file_name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("ndvi_tools");
    path.push(Uuid::new_v4().to_string());
    path.push(file_name);
    path
}

pub fn create_test_raster<T: Copy + GdalType + NumCast>(in_file_name: &str, input_raster_stats: &RasterStats, input_raster_data: &[T]) -> Result<PathBuf> {
    create_test_raster_with_path(
        &get_temp_filename(in_file_name),
        input_raster_stats, input_raster_data)
}

pub fn create_test_raster_with_path<T: Copy + GdalType + NumCast>(input_path: &Path, input_raster_stats: &RasterStats, input_raster_data: &[T]) -> Result<PathBuf> {
    let mut stats = input_raster_stats.clone();
    stats.band_count = 1;

    write_test_bands(input_path, &stats, &[input_raster_data])
}

/// One file, one band per slice of values
pub fn create_test_multiband_raster<T: Copy + GdalType + NumCast>(in_file_name: &str, input_raster_stats: &RasterStats, bands: &[&[T]]) -> Result<PathBuf> {
    let mut stats = input_raster_stats.clone();
    stats.band_count = bands.len() as u32;

    write_test_bands(&get_temp_filename(in_file_name), &stats, bands)
}

fn write_test_bands<T: Copy + GdalType + NumCast>(input_path: &Path, stats: &RasterStats, bands: &[&[T]]) -> Result<PathBuf> {

    if input_path.exists() {
        bail!("{:?} already exists", input_path);
    }

    let num_rows = stats.num_rows as usize;
    let num_cols = stats.num_cols as usize;

    let ds = create_empty_raster::<T>(input_path, stats, false, &DEFAULT_GTIFF_OPTIONS)?;

    for (band_idx, data) in bands.iter().enumerate() {
        if num_rows * num_cols != data.len() {
            bail!("{} values given for a {}x{} raster", data.len(), num_cols, num_rows);
        }

        let mut band = ds.rasterband(band_idx as isize + 1)?;
        band.write((0, 0), (num_cols, num_rows),
                   &Buffer::new((num_cols, num_rows), data.to_vec()))?;
    }

    Ok(input_path.to_path_buf())
}
