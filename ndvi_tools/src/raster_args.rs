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
use anyhow::Result;
use structopt::StructOpt;

use raster_util::raster::{Raster, RasterLocation};

#[derive(StructOpt)]
pub struct RasterArgs {
    #[structopt(help = "Raster path, http(s)/s3/gs URL or GDAL /vsi path")]
    pub raster: RasterLocation,

    #[structopt(long, default_value = "1")]
    pub band: usize,
}

impl RasterArgs {
    pub fn open(&self) -> Result<Raster> {
        Raster::open(&self.raster, true)
    }
}

/// Parses comma separated numbers, as in --window 0,0,512,512
pub fn parse_list<T: std::str::FromStr>(s: &str, expected: usize) -> Result<Vec<T>>
    where T::Err: std::fmt::Display
{
    let values = s.split(',')
        .map(|v| v.trim().parse::<T>().map_err(|e| anyhow::anyhow!("Invalid number {:?}: {}", v, e)))
        .collect::<Result<Vec<T>>>()?;

    if values.len() != expected {
        anyhow::bail!("Expected {} comma separated values, got {:?}", expected, s);
    }

    Ok(values)
}

#[cfg(test)]
mod raster_args_tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list::<u32>("0, 10,512,256", 4).unwrap(), vec![0, 10, 512, 256]);
        assert_eq!(parse_list::<f64>("-1.5,2", 2).unwrap(), vec![-1.5, 2.0]);
        assert!(parse_list::<u32>("1,2,3", 4).is_err());
        assert!(parse_list::<u32>("1,a,3,4", 4).is_err());
    }
}
