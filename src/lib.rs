pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod map_draw;
pub mod state;
pub mod ui;

pub use config::{AtlasConfig, Basemap};
pub use error::{AtlasError, LookupError};
pub use state::AppState;
