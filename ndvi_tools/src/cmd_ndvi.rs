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
use std::path::{Path, PathBuf};

use anyhow::Result;
use gdal::raster::ResampleAlg;
use log::info;
use structopt::StructOpt;

use raster_util::raster::{decimated_shape, ndvi_array, read_decimated, write_quicklook, BandRef, ColorMap, NdviStats, Raster, RasterLocation, Window, DEFAULT_GTIFF_OPTIONS, NDVI_NODATA};
use raster_util::raster::combine_rasters::combine_raster_arrays;

#[derive(StructOpt)]
pub struct NdviArgs {
    #[structopt(long, help = "Raster holding the near infrared band")]
    nir: RasterLocation,

    #[structopt(long, default_value = "1")]
    nir_band: usize,

    #[structopt(long, help = "Raster holding the red band, may be the same file as --nir")]
    red: RasterLocation,

    #[structopt(long, default_value = "1")]
    red_band: usize,

    #[structopt(long, parse(from_os_str))]
    output: PathBuf,

    #[structopt(long)]
    clean: bool,

    #[structopt(long, parse(from_os_str), help = "Also renders the result to this PNG")]
    quicklook: Option<PathBuf>,

    #[structopt(long, default_value = "1", help = "Decimation of the quicklook")]
    quicklook_decimate: u32,
}

/// Writes the NDVI of the two bands as a float32 raster.  None when the output
/// already exists and --clean was not passed.
pub fn create_ndvi_raster(args: &NdviArgs) -> Result<Option<NdviStats>> {

    if args.clean && args.output.exists() {
        remove_file(&args.output)?;
    }

    if args.output.exists() {
        println!("{:?} already exists and --clean not passed, doing nothing", &args.output);
        return Ok(None);
    }

    let nir = BandRef::new(args.nir.clone(), args.nir_band);
    let red = BandRef::new(args.red.clone(), args.red_band);

    info!("NDVI of NIR {} and red {}", nir, red);

    let mut stats = NdviStats::default();

    combine_raster_arrays::<f32, f32, _>(
        &nir,
        &red,
        &args.output,
        NDVI_NODATA as f64,
        &DEFAULT_GTIFF_OPTIONS,
        |nir_values, nir_nodata, red_values, red_nodata| {
            let chunk = ndvi_array(nir_values, red_values, nir_nodata, red_nodata, NDVI_NODATA)?;
            stats = stats.merge(NdviStats::from_array(&chunk, Some(NDVI_NODATA as f64)));
            Ok(chunk)
        },
    )?;

    if let Some(png) = &args.quicklook {
        write_ndvi_quicklook(&args.output, png, args.quicklook_decimate)?;
    }

    Ok(Some(stats))
}

/// Renders an NDVI raster over [-1, 1]
pub fn write_ndvi_quicklook(ndvi_raster: &Path, png: &Path, decimate: u32) -> Result<()> {
    let raster = Raster::read(ndvi_raster, true)?;
    let band = raster.band(1)?;

    let window = Window::full(&raster.stats);
    let shape = decimated_shape(&window, decimate)?;

    let array = read_decimated::<f32>(&band, &raster.stats, &window, shape, Some(ResampleAlg::NearestNeighbour))?;

    write_quicklook(png, &array, raster.stats.no_data_value, &ColorMap::ndvi(), -1.0, 1.0)?;

    info!("Wrote quicklook {:?}", png);

    Ok(())
}

pub fn run_ndvi(args: &NdviArgs) -> Result<()> {
    if let Some(stats) = create_ndvi_raster(args)? {
        println!("NDVI written to {:?}\n{}", &args.output, stats);
    }
    Ok(())
}
