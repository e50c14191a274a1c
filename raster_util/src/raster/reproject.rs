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
use std::path::Path;
use std::ptr::{null, null_mut};

use anyhow::{bail, Context, Result};
use gdal::raster::{GdalType, RasterCreationOption, ResampleAlg};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal_sys::{CPLErr, GDALResampleAlg, OSRAxisMappingStrategy};
use log::{debug, info};
use num::NumCast;

use crate::raster::{create_empty_raster, Raster, RasterStats};

/// Points per edge used when projecting a bounding box
pub const DENSIFY_POINTS: i32 = 21;

/// Parses EPSG:xxxx, WKT or a proj string.  Axis order is always x/lon first.
pub fn spatial_ref_from(definition: &str) -> Result<SpatialRef> {
    let srs = SpatialRef::from_definition(definition)
        .with_context(|| format!("Unknown CRS {:?}", definition))?;
    srs.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    Ok(srs)
}

pub fn raster_spatial_ref(stats: &RasterStats) -> Result<SpatialRef> {
    if stats.projection.is_empty() {
        bail!("Raster has no projection");
    }
    let srs = SpatialRef::from_wkt(&stats.projection)?;
    srs.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    Ok(srs)
}

pub fn project_point(from: &SpatialRef, to: &SpatialRef, x: f64, y: f64) -> Result<(f64, f64)> {
    let transform = CoordTransform::new(from, to)?;

    let mut xs = [x];
    let mut ys = [y];
    let mut zs = [0.0];
    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

    Ok((xs[0], ys[0]))
}

/// (left, bottom, right, top) in the target CRS, edges densified so curved
/// boundaries are covered
pub fn transform_bounds(from: &SpatialRef, to: &SpatialRef, bounds: (f64, f64, f64, f64)) -> Result<(f64, f64, f64, f64)> {
    let transform = CoordTransform::new(from, to)?;
    let (left, bottom, right, top) = bounds;
    let out = transform.transform_bounds(&[left, bottom, right, top], DENSIFY_POINTS)?;

    Ok((out[0], out[1], out[2], out[3]))
}

/// (row, col) of the pixel containing the projected coordinate, None outside the raster
pub fn pixel_of(stats: &RasterStats, x: f64, y: f64) -> Option<(i64, i64)> {
    let col = stats.calc_x(x);
    let row = stats.calc_y(y);

    if stats.contains_pixel(col, row) {
        Some((row, col))
    } else {
        None
    }
}

/// Projected coordinate of the center of (row, col)
pub fn xy_of(stats: &RasterStats, row: i64, col: i64) -> (f64, f64) {
    let [x, y] = stats.calc_center((col, row));
    (x, y)
}

/// Output grid in the target CRS covering the source, with square pixels and the
/// same number of columns as the source
pub fn default_warp_grid(src: &RasterStats, dst_srs: &SpatialRef) -> Result<RasterStats> {
    let src_srs = raster_spatial_ref(src)?;
    let (left, bottom, right, top) = transform_bounds(&src_srs, dst_srs, src.bounds())?;

    if !(right > left && top > bottom) {
        bail!("Degenerate bounds after projection: {} {} {} {}", left, bottom, right, top);
    }

    let pixel_size = (right - left) / src.num_cols as f64;
    let num_rows = ((top - bottom) / pixel_size).ceil().max(1.0) as u32;

    let mut grid = src.clone();
    grid.origin_x = left;
    grid.origin_y = top;
    grid.pixel_width = pixel_size;
    grid.pixel_height = -pixel_size;
    grid.num_rows = num_rows;
    grid.projection = dst_srs.to_wkt()?;

    Ok(grid)
}

fn warp_resample_alg(alg: ResampleAlg) -> Result<GDALResampleAlg::Type> {
    let gra = match alg {
        ResampleAlg::NearestNeighbour => GDALResampleAlg::GRA_NearestNeighbour,
        ResampleAlg::Bilinear => GDALResampleAlg::GRA_Bilinear,
        ResampleAlg::Cubic => GDALResampleAlg::GRA_Cubic,
        ResampleAlg::CubicSpline => GDALResampleAlg::GRA_CubicSpline,
        ResampleAlg::Lanczos => GDALResampleAlg::GRA_Lanczos,
        ResampleAlg::Average => GDALResampleAlg::GRA_Average,
        ResampleAlg::Mode => GDALResampleAlg::GRA_Mode,
        ResampleAlg::Gauss => bail!("gauss resampling is not available when warping"),
    };
    Ok(gra)
}

/// Reprojects all bands of src into a new GeoTIFF.  The warping itself is GDAL's.
pub fn warp_to_crs<T: GdalType + Copy + NumCast>(src: &Raster,
                                                 dst_crs: &str,
                                                 output: &Path,
                                                 resample: ResampleAlg,
                                                 create_options: &[RasterCreationOption]) -> Result<RasterStats> {
    let dst_srs = spatial_ref_from(dst_crs)?;
    let gra = warp_resample_alg(resample)?;

    let grid = default_warp_grid(&src.stats, &dst_srs)?;

    info!("Warping {} to {} => {} cols {} rows, pixel size {}",
          src.location, dst_crs, grid.num_cols, grid.num_rows, grid.pixel_width);

    let dst = create_empty_raster::<T>(output, &grid, true, create_options)?;

    let rv = unsafe {
        gdal_sys::GDALReprojectImage(
            src.dataset.c_dataset(),
            null(),
            dst.c_dataset(),
            null(),
            gra,
            0.0,
            0.0,
            None,
            null_mut(),
            null_mut(),
        )
    };

    if rv != CPLErr::CE_None {
        bail!("GDALReprojectImage failed for {} with error {}", src.location, rv);
    }

    debug!("Warped {} into {:?}", src.location, output);

    Ok(grid)
}

#[cfg(test)]
mod reproject_tests {
    use super::*;
    use crate::raster::raster_stats::sample_stats;

    #[test]
    fn test_pixel_of() {
        let stats = sample_stats();

        assert_eq!(pixel_of(&stats, 4.5, 4.0), Some((0, 0)));
        assert_eq!(pixel_of(&stats, 8.9, -2.9), Some((3, 4)));
        assert_eq!(pixel_of(&stats, 9.1, 0.0), None);
        assert_eq!(pixel_of(&stats, 5.0, 5.5), None);

        let (x, y) = xy_of(&stats, 1, 2);
        assert_eq!((x, y), (6.5, 2.0));
        assert_eq!(pixel_of(&stats, x, y), Some((1, 2)));
    }

    #[test]
    fn test_project_point() {
        let wgs84 = spatial_ref_from("EPSG:4326").unwrap();
        let mercator = spatial_ref_from("EPSG:3857").unwrap();

        let (x, y) = project_point(&wgs84, &mercator, 0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);

        let (x, _) = project_point(&wgs84, &mercator, 180.0, 0.0).unwrap();
        assert!((x - 20037508.342789244).abs() < 1e-3);

        let (lon, lat) = project_point(&mercator, &wgs84, 1113194.9079327357, 0.0).unwrap();
        assert!((lon - 10.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_default_warp_grid() {
        let utm = spatial_ref_from("EPSG:32633").unwrap();
        let src = RasterStats {
            origin_x: 500000.0,
            origin_y: 5000000.0,
            pixel_width: 30.0,
            pixel_height: -30.0,
            num_cols: 100,
            num_rows: 100,
            projection: utm.to_wkt().unwrap(),
            ..sample_stats()
        };

        let wgs84 = spatial_ref_from("EPSG:4326").unwrap();
        let grid = default_warp_grid(&src, &wgs84).unwrap();

        assert_eq!(grid.num_cols, 100);
        assert!(grid.num_rows > 0);
        assert_eq!(grid.pixel_width, -grid.pixel_height);
        //zone 33 is centered on 15 degrees east
        assert!(grid.origin_x > 14.9 && grid.origin_x < 15.1);
        assert!(grid.origin_y > 45.0 && grid.origin_y < 45.2);
    }

    #[test]
    fn test_unknown_crs() {
        assert!(spatial_ref_from("EPSG:not_a_code").is_err());
        assert!(raster_spatial_ref(&sample_stats()).is_err());
    }
}
