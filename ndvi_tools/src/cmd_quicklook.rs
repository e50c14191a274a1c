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
use std::path::PathBuf;

use anyhow::Result;
use log::{debug, info};
use structopt::StructOpt;

use raster_util::raster::{decimated_shape, parse_resample, percentile_stretch, read_decimated, write_quicklook, ColorMap, Histogram, Window};

use crate::raster_args::RasterArgs;

const STRETCH_PERCENTILES: (f64, f64) = (2.0, 98.0);

#[derive(StructOpt)]
pub struct QuicklookArgs {
    #[structopt(flatten)]
    raster: RasterArgs,

    #[structopt(long, default_value = "1", help = "Render at 1/N of the resolution")]
    decimate: u32,

    #[structopt(long, default_value = "nearest")]
    resample: String,

    #[structopt(long, help = "Band holds NDVI, rendered with the NDVI ramp over [-1, 1]")]
    ndvi: bool,

    #[structopt(long, parse(from_os_str))]
    output: PathBuf,

    #[structopt(long, help = "Prints a histogram of the rendered values")]
    histogram: bool,

    #[structopt(long, default_value = "20")]
    bins: usize,

    #[structopt(long)]
    clean: bool,
}

/// Renders the band to a PNG, returns the histogram when asked for one
pub fn create_quicklook(args: &QuicklookArgs) -> Result<Option<Histogram>> {

    if args.clean && args.output.exists() {
        remove_file(&args.output)?;
    }

    if args.output.exists() {
        println!("{:?} already exists and --clean not passed, doing nothing", &args.output);
        return Ok(None);
    }

    let raster = args.raster.open()?;
    let band = raster.band(args.raster.band)?;
    let stats = raster.band_stats(args.raster.band)?;

    let window = Window::full(&stats);
    let shape = decimated_shape(&window, args.decimate)?;
    let resample = parse_resample(&args.resample)?;

    let array = read_decimated::<f64>(&band, &stats, &window, shape, Some(resample))?;

    let (colormap, (min, max)) = if args.ndvi {
        (ColorMap::ndvi(), (-1.0, 1.0))
    } else {
        (ColorMap::greys(), percentile_stretch(&array, stats.no_data_value,
                                               STRETCH_PERCENTILES.0, STRETCH_PERCENTILES.1)?)
    };

    debug!("Stretching {} over {} to {}", raster.location, min, max);

    write_quicklook(&args.output, &array, stats.no_data_value, &colormap, min, max)?;

    info!("Wrote {}x{} quicklook {:?}", shape.1, shape.0, &args.output);

    if !args.histogram {
        return Ok(None);
    }

    let hist_max = if max > min { max } else { min + 1.0 };
    Ok(Some(Histogram::from_array(&array, stats.no_data_value, args.bins, min, hist_max)?))
}

pub fn run_quicklook(args: &QuicklookArgs) -> Result<()> {
    if let Some(hist) = create_quicklook(args)? {
        println!("{}", hist);
    }
    Ok(())
}

#[cfg(test)]
mod cmd_quicklook_tests {
    use gdal::raster::GdalDataType;
    use raster_util::raster::{create_test_raster, get_temp_filename, Raster, RasterLocation, RasterStats};

    use super::*;

    #[test]
    fn test_quicklook_with_histogram() {
        let stats = RasterStats {
            origin_y: 10.0,
            origin_x: 0.0,
            pixel_height: -1.0,
            pixel_width: 1.0,
            num_rows: 4,
            num_cols: 4,
            band_count: 1,
            no_data_value: Some(-9999.0),
            data_type: GdalDataType::Float32,
            projection: "".to_string(),
        };

        let mut data: Vec<f32> = (0..16).map(|v| v as f32 / 8.0 - 1.0).collect();
        data[0] = -9999.0;

        let path = create_test_raster("ndvi.tif", &stats, &data).unwrap();
        let output = get_temp_filename("ndvi_quicklook.png");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();

        let args = QuicklookArgs {
            raster: RasterArgs { raster: RasterLocation::from(path), band: 1 },
            decimate: 2,
            resample: "nearest".to_string(),
            ndvi: true,
            output: output.clone(),
            histogram: true,
            bins: 4,
            clean: false,
        };

        let hist = create_quicklook(&args).unwrap().unwrap();

        //2x2 nearest neighbour picks one pixel in each 2x2 block
        assert_eq!(hist.total() + hist.outside, 4);
        assert_eq!(hist.counts.len(), 4);

        let png = Raster::read(&output, true).unwrap();
        assert_eq!(png.stats.num_cols, 2);
        assert_eq!(png.stats.band_count, 4);

        assert!(create_quicklook(&args).unwrap().is_none());
    }
}
