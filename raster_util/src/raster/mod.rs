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
use anyhow::{bail, Context, Result};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use gdal::raster::RasterBand;
use log::debug;

mod location;
mod raster_stats;
mod algo;
mod read;
mod ndvi;
mod value_stats;
pub mod combine_rasters;
mod reproject;
mod vrt;
mod quicklook;

mod test_util;

pub use location::*;
pub use raster_stats::*;
pub use algo::*;
pub use read::*;
pub use ndvi::*;
pub use value_stats::*;
pub use combine_rasters::*;
pub use reproject::*;
pub use vrt::*;
pub use quicklook::*;
pub use test_util::*;

/// An open raster together with the record of its first band
pub struct Raster
{
    pub location: RasterLocation,
    pub stats: RasterStats,
    pub dataset: Dataset,
}

impl Raster {
    pub fn open(location: &RasterLocation, readonly: bool) -> Result<Raster> {
        debug!("Opening raster {}", location);

        if location.is_remote() {
            configure_remote_access()?;
        }

        let access = if readonly {
            GdalOpenFlags::GDAL_OF_READONLY
        } else {
            GdalOpenFlags::GDAL_OF_UPDATE
        };

        let options = DatasetOptions {
            open_flags: access | GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR,
            ..DatasetOptions::default()
        };

        let dataset = Dataset::open_ex(location.gdal_path(), options)
            .with_context(|| format!("Unable to open raster {}", location))?;

        if dataset.raster_count() < 1 {
            bail!("{} has no raster bands", location);
        }

        let stats = {
            let band = dataset.rasterband(1)?;
            RasterStats::new(&dataset, &band)
        };

        Ok(Raster {
            location: location.clone(),
            stats,
            dataset,
        })
    }

    pub fn read(path: &std::path::Path, readonly: bool) -> Result<Raster> {
        Raster::open(&RasterLocation::from(path), readonly)
    }

    /// 1 based, like GDAL
    pub fn band(&self, band_index: usize) -> Result<RasterBand> {
        let band_count = self.dataset.raster_count() as usize;
        if band_index < 1 || band_index > band_count {
            bail!("Band {} requested but {} has {} bands", band_index, self.location, band_count);
        }
        Ok(self.dataset.rasterband(band_index as isize)?)
    }

    /// Record of the given band, the bands may differ in type and nodata
    pub fn band_stats(&self, band_index: usize) -> Result<RasterStats> {
        let band = self.band(band_index)?;
        Ok(RasterStats::new(&self.dataset, &band))
    }

    pub fn driver_name(&self) -> String {
        self.dataset.driver().short_name()
    }
}

/// A band of a raster, so NDVI can be taken from two bands of one file or from two files
#[derive(Debug, Clone)]
pub struct BandRef {
    pub location: RasterLocation,
    pub band: usize,
}

impl BandRef {
    pub fn new(location: RasterLocation, band: usize) -> Self {
        BandRef { location, band }
    }
}

impl std::fmt::Display for BandRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} band {}", self.location, self.band)
    }
}
