use std::{io, path::PathBuf};
use thiserror::Error;

/// Startup load failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("invalid forest cover dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    #[error("feature file must be a GeoJSON FeatureCollection")]
    NotACollection,

    #[error("feature #{index} has no point geometry")]
    Geometry { index: usize },

    #[error("feature #{index} has no string `location` property")]
    MissingLocation { index: usize },

    #[error("{} feature location(s) missing from the dataset: {}", .0.len(), .0.join(", "))]
    Integrity(Vec<String>),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A map feature points at a region the dataset does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no forest cover record for location `{location}`")]
pub struct LookupError {
    pub location: String,
}
