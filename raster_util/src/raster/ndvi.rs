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
use ndarray::{Array2, Zip};

use crate::raster::{IsNoData, ValueStats};

/// Output nodata of NDVI rasters
pub const NDVI_NODATA: f32 = -9999.0;

/// Normalized difference vegetation index, (nir - red) / (nir + red).
///
/// None when the index is undefined, that is nir + red == 0 or an input is not finite.
/// For non negative reflectances the result is within [-1, 1].
#[inline]
pub fn ndvi(nir: f64, red: f64) -> Option<f64> {
    if !nir.is_finite() || !red.is_finite() {
        return None;
    }

    let sum = nir + red;
    if sum == 0.0 {
        return None;
    }

    Some((nir - red) / sum)
}

/// Elementwise NDVI of two bands of the same shape.  Nodata inputs and undefined
/// pixels are set to nodata_out.
pub fn ndvi_array(nir: &Array2<f32>,
                  red: &Array2<f32>,
                  nir_nodata: Option<f64>,
                  red_nodata: Option<f64>,
                  nodata_out: f32) -> Result<Array2<f32>> {

    if nir.dim() != red.dim() {
        bail!("NIR shape {:?} and red shape {:?} differ", nir.dim(), red.dim());
    }

    let mut out = Array2::<f32>::from_elem(nir.dim(), nodata_out);

    Zip::from(&mut out).and(nir).and(red).par_for_each(|o, &n, &r| {
        if n.is_value_nodata(nir_nodata) || r.is_value_nodata(red_nodata) {
            return;
        }
        if let Some(v) = ndvi(n as f64, r as f64) {
            *o = v as f32;
        }
    });

    Ok(out)
}

/// Summary of NDVI values, nodata excluded
pub type NdviStats = ValueStats;

#[cfg(test)]
mod ndvi_tests {
    use super::*;
    use float_cmp::{ApproxEq, F64Margin};
    use ndarray::array;

    #[test]
    fn test_ndvi_formula() {
        let margin = F64Margin { epsilon: 1e-12, ulps: 4 };

        assert!(ndvi(0.5, 0.1).unwrap().approx_eq(0.4 / 0.6, margin));
        assert!(ndvi(3000.0, 1000.0).unwrap().approx_eq(0.5, margin));
        assert!(ndvi(1000.0, 3000.0).unwrap().approx_eq(-0.5, margin));
        assert_eq!(ndvi(7.0, 7.0), Some(0.0));
        assert_eq!(ndvi(5.0, 0.0), Some(1.0));
        assert_eq!(ndvi(0.0, 5.0), Some(-1.0));
    }

    #[test]
    fn test_ndvi_undefined() {
        assert_eq!(ndvi(0.0, 0.0), None);
        assert_eq!(ndvi(2.0, -2.0), None);
        assert_eq!(ndvi(f64::NAN, 1.0), None);
        assert_eq!(ndvi(1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_ndvi_range() {
        //non negative reflectances always land in [-1, 1]
        for nir in (0..=40).map(|v| v as f64 * 250.0) {
            for red in (0..=40).map(|v| v as f64 * 250.0) {
                match ndvi(nir, red) {
                    Some(v) => assert!((-1.0..=1.0).contains(&v), "{} {} => {}", nir, red, v),
                    None => assert_eq!(nir + red, 0.0),
                }
            }
        }
    }

    #[test]
    fn test_ndvi_array() {
        let nir = array![[0.5f32, 0.0], [4.0, 0.0]];
        let red = array![[0.1f32, 0.0], [1.0, 2.0]];

        let out = ndvi_array(&nir, &red, None, Some(1.0), NDVI_NODATA).unwrap();

        assert!((out[[0, 0]] - 0.4 / 0.6).abs() < 1e-6);
        //0 / 0
        assert_eq!(out[[0, 1]], NDVI_NODATA);
        //red is nodata
        assert_eq!(out[[1, 0]], NDVI_NODATA);
        assert_eq!(out[[1, 1]], -1.0);

        let bad = array![[1.0f32, 2.0, 3.0]];
        assert!(ndvi_array(&nir, &bad, None, None, NDVI_NODATA).is_err());
    }

    #[test]
    fn test_ndvi_stats() {
        let values = array![[0.5f32, NDVI_NODATA], [-0.5, 0.25]];
        let stats = NdviStats::from_array(&values, Some(NDVI_NODATA as f64));

        assert_eq!(stats.count, 3);
        assert_eq!(stats.nodata_count, 1);
        assert_eq!(stats.min, -0.5);
        assert_eq!(stats.max, 0.5);
        assert!((stats.mean().unwrap() - 0.25 / 3.0).abs() < 1e-12);

        let empty = NdviStats::default();
        assert_eq!(empty.mean(), None);
        assert_eq!(empty.merge(stats), stats);
    }
}
