//! GarmentKit Settings Crate
//!
//! Handles the garment catalog, designer tuning and their persistence.

pub mod config;
pub mod error;

pub use config::{
    Anchor, BackgroundSettings, CaptureSettings, Config, DesignerSettings, GarmentSpec, InchSize,
    PriceTier, SideOverrides, MAX_EXPORT_EDGE,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
