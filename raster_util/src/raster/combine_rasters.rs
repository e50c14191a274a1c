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
use std::path::Path;

use anyhow::{bail, Result};
use gdal::raster::{Buffer, GdalType, RasterCreationOption};
use log::{debug, info};
use ndarray::Array2;
use num::NumCast;

use crate::raster::{create_empty_raster, BandRef, IsNoData, Raster, RasterStats};
use crate::util::{format_duration, ProgressLogger, RasterChunkIterator};

/// Combines 2 bands pixel by pixel into a new single band raster.
///
/// Both bands must share the same grid.  combine_func gets each value with a flag
/// telling whether it is nodata, and the output inherits the record of the left band
/// with nodata_output as its nodata value.
pub fn combine_rasters<T, O, F>(lhs: &BandRef,
                                rhs: &BandRef,
                                raster_output: &Path,
                                nodata_output: f64,
                                create_options: &[RasterCreationOption],
                                mut combine_func: F) -> Result<()>
where T: Copy + GdalType + IsNoData,
      O: Copy + GdalType + NumCast,
      F: FnMut(T, bool, T, bool) -> Result<O>
{
    combine_chunks::<T, O, _>(lhs, rhs, raster_output, nodata_output, create_options,
                              |chunk, left_data, right_data| {
        let mut output_data = Vec::with_capacity(left_data.len());

        for (idx, (&v1, &v2)) in left_data.iter().zip(right_data.iter()).enumerate() {

            match combine_func(v1, v1.is_value_nodata(chunk.no_data_left),
                               v2, v2.is_value_nodata(chunk.no_data_right)) {
                Ok(result_value) => output_data.push(result_value),
                Err(e) => {
                    let raster_x = (chunk.offset.0 + idx % chunk.size.0) as i64;
                    let raster_y = (chunk.offset.1 + idx / chunk.size.0) as i64;
                    let [coord_x, coord_y] = chunk.stats.calc_center((raster_x, raster_y));

                    bail!("Combine Raster Problem at {},{} coords {},{}.  {}",
                          raster_x, raster_y, coord_x, coord_y, e);
                }
            }
        }

        Ok(output_data)
    })
}

/// Like combine_rasters but combine_func gets whole (rows, cols) chunks with the
/// nodata values of both bands, so the per pixel work can run in parallel.
pub fn combine_raster_arrays<T, O, F>(lhs: &BandRef,
                                      rhs: &BandRef,
                                      raster_output: &Path,
                                      nodata_output: f64,
                                      create_options: &[RasterCreationOption],
                                      mut combine_func: F) -> Result<()>
where T: Copy + GdalType,
      O: Copy + GdalType + NumCast,
      F: FnMut(&Array2<T>, Option<f64>, &Array2<T>, Option<f64>) -> Result<Array2<O>>
{
    combine_chunks::<T, O, _>(lhs, rhs, raster_output, nodata_output, create_options,
                              |chunk, left_data, right_data| {
        let shape = (chunk.size.1, chunk.size.0);
        let left = Array2::from_shape_vec(shape, left_data)?;
        let right = Array2::from_shape_vec(shape, right_data)?;

        let output = combine_func(&left, chunk.no_data_left, &right, chunk.no_data_right)?;

        if output.dim() != shape {
            bail!("Combined chunk has shape {:?}, expected {:?}", output.dim(), shape);
        }

        Ok(output.iter().copied().collect())
    })
}

/// Window being combined, in pixels of the left band
struct Chunk<'a> {
    offset: (usize, usize),
    //(cols, rows)
    size: (usize, usize),
    stats: &'a RasterStats,
    no_data_left: Option<f64>,
    no_data_right: Option<f64>,
}

fn combine_chunks<T, O, F>(lhs: &BandRef,
                           rhs: &BandRef,
                           raster_output: &Path,
                           nodata_output: f64,
                           create_options: &[RasterCreationOption],
                           mut chunk_func: F) -> Result<()>
where T: Copy + GdalType,
      O: Copy + GdalType + NumCast,
      F: FnMut(&Chunk, Vec<T>, Vec<T>) -> Result<Vec<O>>
{
    let mut progress = ProgressLogger::new(3);

    let raster_lhs = Raster::open(&lhs.location, true)?;
    let raster_rhs = Raster::open(&rhs.location, true)?;

    let stats_lhs = raster_lhs.band_stats(lhs.band)?;
    let stats_rhs = raster_rhs.band_stats(rhs.band)?;

    info!("Stats Left ({}):\n{}", lhs, stats_lhs);
    debug!("No data left: {:?} Right: {:?}", stats_lhs.no_data_value, stats_rhs.no_data_value);

    stats_lhs.check_same_grid(&stats_rhs)?;

    if raster_output.exists() {
        remove_file(raster_output)?;
    }

    let mut new_stats = stats_lhs.clone();
    new_stats.no_data_value = Some(nodata_output);
    new_stats.data_type = O::datatype();
    new_stats.band_count = 1;

    let output_ds = create_empty_raster::<O>(raster_output, &new_stats, false, create_options)?;
    let mut output_band = output_ds.rasterband(1)?;

    let band_lhs = raster_lhs.band(lhs.band)?;
    let band_rhs = raster_rhs.band(rhs.band)?;

    let number_of_chunks = 10;

    for raster_window in RasterChunkIterator::<usize>::new(new_stats.num_rows as usize,
                                                           new_stats.num_cols as usize,
                                                           number_of_chunks)
    {
        let offset = (raster_window.window_offset.0 as isize, raster_window.window_offset.1 as isize);
        let size = raster_window.window_size;

        let left_data = band_lhs.read_as::<T>(offset, size, size, None)?.data;
        let right_data = band_rhs.read_as::<T>(offset, size, size, None)?.data;

        if left_data.len() != right_data.len() {
            bail!("Read {} values left and {} right for window {:?} {:?}",
                  left_data.len(), right_data.len(), offset, size);
        }

        let chunk = Chunk {
            offset: raster_window.window_offset,
            size,
            stats: &stats_lhs,
            no_data_left: stats_lhs.no_data_value,
            no_data_right: stats_rhs.no_data_value,
        };

        let output_data = chunk_func(&chunk, left_data, right_data)?;

        if output_data.len() != size.0 * size.1 {
            bail!("Combined {} values for a {}x{} window", output_data.len(), size.0, size.1);
        }

        output_band.write(offset, size, &Buffer::new(size, output_data))?;

        progress.step(raster_window.current_step, raster_window.num_steps);
    }

    info!("Combined {} and {} into {:?} in {}", lhs, rhs, raster_output, format_duration(progress.elapsed()));

    Ok(())
}

#[cfg(test)]
mod raster_combine_test {
    use super::*;
    use crate::raster::{create_test_raster, get_temp_filename, DEFAULT_GTIFF_OPTIONS, RasterLocation, RasterStats};
    use crate::raster::raster_stats::sample_stats;
    use gdal::raster::GdalDataType;

    #[test]
    fn test_simple_add() {
        let lhs_stats = RasterStats {
            num_rows: 3,
            num_cols: 3,
            no_data_value: Some(-1000.0),
            data_type: GdalDataType::Int16,
            ..sample_stats()
        };

        let mut rhs_stats = lhs_stats.clone();
        rhs_stats.data_type = GdalDataType::UInt32;
        rhs_stats.no_data_value = Some(10000.0);

        let mut lhs_data: Vec<i16> = (-9..0).rev().collect();
        lhs_data[8] = -50;
        lhs_data[7] = -1000;
        lhs_data[5] = -1000;
        let lhs_path = create_test_raster("lhs.tif", &lhs_stats, &lhs_data).unwrap();

        let mut rhs_data: Vec<u32> = (10..19).collect();
        rhs_data[8] = 200;
        rhs_data[7] = 10000;
        rhs_data[6] = 10000;
        let rhs_path = create_test_raster("rhs.tif", &rhs_stats, &rhs_data).unwrap();

        let output = get_temp_filename("add_result.tif");

        let nodata_output = -999999.0;
        combine_rasters::<i32, i32, _>(
            &BandRef::new(RasterLocation::from(lhs_path), 1),
            &BandRef::new(RasterLocation::from(rhs_path), 1),
            &output, nodata_output, &DEFAULT_GTIFF_OPTIONS,
            |v1, is_nodata1, v2, is_nodata2| {

                if is_nodata1 && is_nodata2 {
                    return Ok(nodata_output as i32);
                }
                if is_nodata1 {
                    return Ok(v2);
                }
                if is_nodata2 {
                    return Ok(v1);
                }

                Ok(v1 + v2)
            }).unwrap();

        assert!(output.exists());

        let output_raster = Raster::read(&output, true).unwrap();
        assert_eq!(output_raster.stats.no_data_value, Some(nodata_output));

        let data: Vec<i32> = output_raster.band(1).unwrap().read_as((0, 0), (3, 3), (3, 3), None).unwrap().data;

        assert_eq!(data[0], 9);
        //nodata on left
        assert_eq!(data[5], rhs_data[5] as i32);
        //nodata on right
        assert_eq!(data[6], lhs_data[6] as i32);
        assert_eq!(data[7], nodata_output as i32);
        assert_eq!(data[8], 150);
    }

    #[test]
    fn test_grid_mismatch() {
        let lhs_stats = sample_stats();
        let mut rhs_stats = sample_stats();
        rhs_stats.num_cols = 4;

        let lhs_path = create_test_raster("lhs.tif", &lhs_stats, &vec![1f32; 20]).unwrap();
        let rhs_path = create_test_raster("rhs.tif", &rhs_stats, &vec![1f32; 16]).unwrap();

        let output = get_temp_filename("mismatch.tif");

        let r = combine_rasters::<f32, f32, _>(
            &BandRef::new(RasterLocation::from(lhs_path), 1),
            &BandRef::new(RasterLocation::from(rhs_path), 1),
            &output, -1.0, &DEFAULT_GTIFF_OPTIONS,
            |v1, _, v2, _| Ok(v1 + v2));

        assert!(r.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_combine_arrays() {
        //4 rows 5 cols, nodata 3.2
        let stats = sample_stats();

        let lhs_data: Vec<f32> = (0..20).map(|v| v as f32).collect();
        let mut rhs_data: Vec<f32> = vec![100.0; 20];
        rhs_data[7] = 3.2;

        let lhs_path = create_test_raster("lhs.tif", &stats, &lhs_data).unwrap();
        let rhs_path = create_test_raster("rhs.tif", &stats, &rhs_data).unwrap();

        let output = get_temp_filename("arrays.tif");

        let mut num_calls = 0;
        combine_raster_arrays::<f32, f32, _>(
            &BandRef::new(RasterLocation::from(lhs_path), 1),
            &BandRef::new(RasterLocation::from(rhs_path), 1),
            &output, -1.0, &DEFAULT_GTIFF_OPTIONS,
            |left, left_nodata, right, right_nodata| {
                num_calls += 1;
                let mut out = left + right;
                ndarray::Zip::from(&mut out).and(left).and(right).for_each(|o, &l, &r| {
                    if l.is_value_nodata(left_nodata) || r.is_value_nodata(right_nodata) {
                        *o = -1.0;
                    }
                });
                Ok(out)
            }).unwrap();

        assert!(num_calls > 1);

        let data: Vec<f32> = Raster::read(&output, true).unwrap().band(1).unwrap().read_band_as::<f32>().unwrap().data;

        assert_eq!(data[0], 100.0);
        //row 1 col 2
        assert_eq!(data[7], -1.0);
        //row 3 col 4
        assert_eq!(data[19], 119.0);
        assert_eq!(data[6], 106.0);

        let r = combine_raster_arrays::<f32, f32, _>(
            &BandRef::new(RasterLocation::from(get_temp_filename("missing.tif")), 1),
            &BandRef::new(RasterLocation::from(get_temp_filename("missing.tif")), 1),
            &get_temp_filename("never.tif"), -1.0, &DEFAULT_GTIFF_OPTIONS,
            |left, _, _, _| Ok(left.clone()));
        assert!(r.is_err());
    }

    #[test]
    fn test_combine_arrays_wrong_shape() {
        let stats = sample_stats();
        let lhs_path = create_test_raster("lhs.tif", &stats, &vec![1f32; 20]).unwrap();

        let r = combine_raster_arrays::<f32, f32, _>(
            &BandRef::new(RasterLocation::from(lhs_path.clone()), 1),
            &BandRef::new(RasterLocation::from(lhs_path), 1),
            &get_temp_filename("wrong_shape.tif"), -1.0, &DEFAULT_GTIFF_OPTIONS,
            |_, _, _, _| Ok(ndarray::Array2::<f32>::zeros((1, 1))));

        assert!(r.is_err());
    }
}
