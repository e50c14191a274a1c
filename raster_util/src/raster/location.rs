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
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use gdal::config::{get_config_option, set_config_option};
use log::debug;

/// Where a raster lives, a local file or something GDAL reads through one of its
/// virtual file systems
#[derive(Debug, Clone, PartialEq)]
pub enum RasterLocation {
    Local(PathBuf),
    Remote {
        url: String,
        vsi_path: String,
    },
}

const VSI_PREFIXES: [(&str, &str); 4] = [
    ("http://", "/vsicurl/"),
    ("https://", "/vsicurl/"),
    ("s3://", "/vsis3/"),
    ("gs://", "/vsigs/"),
];

/// Options GDAL needs to read cloud optimized rasters without listing directories
/// or issuing one request per block
pub const REMOTE_ACCESS_OPTIONS: [(&str, &str); 4] = [
    ("GDAL_DISABLE_READDIR_ON_OPEN", "EMPTY_DIR"),
    ("CPL_VSIL_CURL_ALLOWED_EXTENSIONS", ".tif,.TIF,.tiff,.vrt"),
    ("GDAL_HTTP_MULTIRANGE", "YES"),
    ("GDAL_HTTP_MERGE_CONSECUTIVE_RANGES", "YES"),
];

impl RasterLocation {
    pub fn parse(s: &str) -> Self {
        for (scheme, vsi) in VSI_PREFIXES.iter() {
            if let Some(rest) = s.strip_prefix(scheme) {
                let vsi_path = if *vsi == "/vsicurl/" {
                    //vsicurl wants the full url, the object stores only bucket/key
                    format!("{}{}", vsi, s)
                } else {
                    format!("{}{}", vsi, rest)
                };
                return RasterLocation::Remote { url: s.to_string(), vsi_path };
            }
        }

        if s.starts_with("/vsi") {
            return RasterLocation::Remote { url: s.to_string(), vsi_path: s.to_string() };
        }

        RasterLocation::Local(PathBuf::from(s))
    }

    /// The name handed to GDALOpen
    pub fn gdal_path(&self) -> PathBuf {
        match self {
            RasterLocation::Local(p) => p.clone(),
            RasterLocation::Remote { vsi_path, .. } => PathBuf::from(vsi_path),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, RasterLocation::Remote { .. })
    }
}

impl From<&Path> for RasterLocation {
    fn from(p: &Path) -> Self {
        RasterLocation::Local(p.to_path_buf())
    }
}

impl From<PathBuf> for RasterLocation {
    fn from(p: PathBuf) -> Self {
        RasterLocation::Local(p)
    }
}

impl FromStr for RasterLocation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            bail!("Empty raster location");
        }
        Ok(RasterLocation::parse(s))
    }
}

impl fmt::Display for RasterLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RasterLocation::Local(p) => write!(f, "{}", p.display()),
            RasterLocation::Remote { url, .. } => write!(f, "{}", url),
        }
    }
}

/// Sets the remote access options the user has not set with --config or the environment
pub fn configure_remote_access() -> Result<()> {
    for (key, value) in REMOTE_ACCESS_OPTIONS.iter() {
        let current = get_config_option(key, "")?;
        if !current.is_empty() {
            debug!("Keeping GDAL config {}={}", key, current);
            continue;
        }
        debug!("Setting GDAL config {}={}", key, value);
        set_config_option(key, value)?;
    }
    Ok(())
}

/// Splits KEY=VALUE
pub fn parse_config_option(s: &str) -> Result<(String, String)> {
    let (key, value) = match s.split_once('=') {
        Some(kv) => kv,
        None => bail!("Config option {:?} is not of the form KEY=VALUE", s),
    };

    let key = key.trim();
    if key.is_empty() {
        bail!("Config option {:?} has an empty key", s);
    }

    Ok((key.to_string(), value.trim().to_string()))
}

pub fn set_config_options<S: AsRef<str>>(options: &[S]) -> Result<()> {
    for option in options {
        let (key, value) = parse_config_option(option.as_ref())?;
        debug!("Setting GDAL config {}={}", key, value);
        set_config_option(&key, &value)
            .with_context(|| format!("Unable to set GDAL config option {}", key))?;
    }
    Ok(())
}
