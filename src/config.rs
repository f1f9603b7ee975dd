use clap::ValueEnum;
use geo::Coord;
use std::path::PathBuf;

use crate::error::AtlasError;

/// Initial view, centered on India.
pub const DEFAULT_CENTER: Coord<f64> = Coord { x: 79.035645, y: 23.0 };
pub const DEFAULT_ZOOM: f64 = 4.8;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 12.0;

/// Background layer under the region markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Basemap {
    /// Coarse world coastline.
    Low,
    /// Detailed world coastline.
    #[default]
    High,
    /// No background; markers only.
    None,
}

/// Validated runtime settings.
#[derive(Clone, Debug)]
pub struct AtlasConfig {
    pub data_dir: PathBuf,
    pub features_file: String,
    pub dataset_file: String,
    pub center: Coord<f64>,
    pub zoom: f64,
    pub basemap: Basemap,
    pub strict: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            features_file: "features.json".into(),
            dataset_file: "data.json".into(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            basemap: Basemap::default(),
            strict: false,
            log_file: None,
        }
    }
}

impl AtlasConfig {
    pub fn validate(self) -> Result<Self, AtlasError> {
        let Coord { x: lon, y: lat } = self.center;
        if !(-180.0..=180.0).contains(&lon) {
            return Err(AtlasError::Config(format!("center longitude {lon} is outside -180..180")));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AtlasError::Config(format!("center latitude {lat} is outside -90..90")));
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(AtlasError::Config(format!(
                "zoom {} is outside {MIN_ZOOM}..{MAX_ZOOM}",
                self.zoom
            )));
        }
        if self.features_file.is_empty() || self.dataset_file.is_empty() {
            return Err(AtlasError::Config("data file names must not be empty".into()));
        }
        Ok(self)
    }
}
