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

use anyhow::{bail, Context, Result};
use gdal::Dataset;
use gdal::programs::raster::{build_vrt as gdal_build_vrt, BuildVRTOptions};
use log::info;

use crate::raster::{Raster, RasterLocation};

/// gdalbuildvrt arguments for the mosaic or band stack
pub fn build_vrt_args(separate: bool, resample: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();
    if separate {
        args.push("-separate".to_string());
    }
    if let Some(r) = resample {
        args.push("-r".to_string());
        args.push(r.to_string());
    }
    args
}

/// Writes a VRT referencing the inputs.  With separate each input becomes its own
/// band, otherwise the inputs are mosaicked.
pub fn build_vrt(inputs: &[RasterLocation], output: &Path, separate: bool, resample: Option<&str>) -> Result<()> {
    if inputs.is_empty() {
        bail!("No inputs given for the VRT");
    }

    let rasters = inputs.iter()
        .map(|location| Raster::open(location, true))
        .collect::<Result<Vec<Raster>>>()?;
    let datasets = rasters.iter().map(|r| &r.dataset).collect::<Vec<&Dataset>>();

    let options = BuildVRTOptions::new(build_vrt_args(separate, resample))?;

    let vrt = gdal_build_vrt(Some(output), &datasets, Some(options))
        .with_context(|| format!("Unable to build VRT {:?}", output))?;

    let (cols, rows) = vrt.raster_size();
    info!("Wrote VRT {:?} with {} bands, {}x{}", output, vrt.raster_count(), cols, rows);

    Ok(())
}

#[cfg(test)]
mod vrt_tests {
    use super::*;
    use crate::raster::{create_test_raster, get_temp_filename};
    use crate::raster::raster_stats::sample_stats;

    #[test]
    fn test_build_vrt_args() {
        assert!(build_vrt_args(false, None).is_empty());
        assert_eq!(build_vrt_args(true, Some("average")), vec!["-separate", "-r", "average"]);
    }

    #[test]
    fn test_stack_bands() {
        let stats = sample_stats();
        let red = create_test_raster("red.tif", &stats, &vec![1f32; 20]).unwrap();
        let nir = create_test_raster("nir.tif", &stats, &vec![2f32; 20]).unwrap();

        let output = get_temp_filename("stack.vrt");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();

        build_vrt(&[RasterLocation::from(red.clone()), RasterLocation::from(nir)], &output, true, None).unwrap();

        let vrt = Raster::read(&output, true).unwrap();
        assert_eq!(vrt.stats.band_count, 2);
        assert_eq!(vrt.stats.num_cols, 5);

        let nir_values: Vec<f32> = vrt.band(2).unwrap().read_band_as::<f32>().unwrap().data;
        assert!(nir_values.iter().all(|v| *v == 2.0));

        assert!(build_vrt(&[], &output, true, None).is_err());

        let missing = RasterLocation::parse("does/not/exist.tif");
        let err = build_vrt(&[RasterLocation::from(red), missing], &output, true, None).unwrap_err();
        assert!(format!("{:#}", err).contains("does/not/exist.tif"));
    }
}
