//! Configuration and settings management for GarmentKit
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Garment catalog (print areas, placement, margins, prices, colors)
//! - Background photo location
//! - Designer tuning (history depth, debounce, DPI, stage size)
//! - Capture tuning (auto-crop thresholds, neutral fill)

use garmentkit_core::Side;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Physical size of a print area in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InchSize {
    /// Width in inches
    pub width: f64,
    /// Height in inches
    pub height: f64,
}

impl InchSize {
    /// Creates a new size in inches.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A value with optional per-side overrides.
///
/// Sides without an override use `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SideOverrides<T> {
    /// Value used by every side without an override
    pub default: T,
    /// Front override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<T>,
    /// Back override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<T>,
}

impl<T> SideOverrides<T> {
    /// Same value on every side.
    pub fn uniform(default: T) -> Self {
        Self {
            default,
            front: None,
            back: None,
        }
    }

    /// Resolve the value for a side.
    pub fn resolve(&self, side: Side) -> &T {
        let specific = match side {
            Side::Front => self.front.as_ref(),
            Side::Back => self.back.as_ref(),
        };
        specific.unwrap_or(&self.default)
    }

    fn values(&self) -> impl Iterator<Item = (&'static str, &T)> {
        std::iter::once(("default", &self.default))
            .chain(self.front.as_ref().map(|v| ("front", v)))
            .chain(self.back.as_ref().map(|v| ("back", v)))
    }
}

/// Placement of the print-area center as a fraction of canvas size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Horizontal fraction (0.0 = left edge, 1.0 = right edge)
    pub x: f64,
    /// Vertical fraction (0.0 = top edge, 1.0 = bottom edge)
    pub y: f64,
}

impl Default for Anchor {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Flat price tiers in minor currency units (cents)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Price when exactly one side carries a print
    pub one_side: u32,
    /// Price when both sides carry a print
    pub both_sides: u32,
}

/// One garment type in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentSpec {
    /// Human-readable name
    pub display_name: String,
    /// Printable area per side
    pub print_area: SideOverrides<InchSize>,
    /// Center of the print area on the canvas
    #[serde(default)]
    pub anchor: Anchor,
    /// Fraction of the fitted area actually used (1.0 = edge to edge)
    pub margin: SideOverrides<f64>,
    /// Price tiers
    pub price: PriceTier,
    /// Available colors (first is the default)
    #[serde(default)]
    pub colors: Vec<String>,
}

impl GarmentSpec {
    /// Default color for this garment, if any colors are listed.
    pub fn default_color(&self) -> Option<&str> {
        self.colors.first().map(String::as_str)
    }
}

/// Where garment photos live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSettings {
    /// Template with `{garment}`, `{color}` and `{side}` placeholders
    pub url_template: String,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            url_template: "garments/{garment}/{color}/{side}.png".to_string(),
        }
    }
}

impl BackgroundSettings {
    /// Resolve the background URL for a variant.
    pub fn url_for(&self, garment: &str, color: &str, side: Side) -> String {
        self.url_template
            .replace("{garment}", garment)
            .replace("{color}", color)
            .replace("{side}", side.as_str())
    }
}

/// Designer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignerSettings {
    /// Maximum entries kept on each undo and redo stack
    pub history_limit: usize,
    /// Quiet period before an edit is committed to history
    pub debounce_ms: u64,
    /// Pixels per inch used to size print areas
    pub dpi: f64,
    /// Stage width in pixels
    pub canvas_width: f64,
    /// Stage height in pixels
    pub canvas_height: f64,
    /// Family used when a text object's font is unavailable
    pub default_font_family: String,
    /// Garment selected when a session starts
    pub default_garment: String,
}

impl Default for DesignerSettings {
    fn default() -> Self {
        Self {
            history_limit: 50,
            debounce_ms: 260,
            dpi: garmentkit_core::units::DEFAULT_DPI,
            canvas_width: 1800.0,
            canvas_height: 1200.0,
            default_font_family: "Sans".to_string(),
            default_garment: "men".to_string(),
        }
    }
}

/// Capture and auto-crop tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Largest dimension of the auto-crop sampling image
    pub auto_crop_max_dimension: u32,
    /// Sampling stride in pixels
    pub auto_crop_step: u32,
    /// RGB distance above which a pixel counts as foreground
    pub auto_crop_threshold: f64,
    /// Pixels with lower alpha count as background
    pub auto_crop_alpha_floor: u8,
    /// Horizontal padding as a fraction of the crop width
    pub auto_crop_pad_x: f64,
    /// Vertical padding as a fraction of the crop height
    pub auto_crop_pad_y: f64,
    /// Widest allowed width/height ratio before height is padded
    pub auto_crop_max_aspect: f64,
    /// Fill used when the background photo is unavailable
    pub neutral_fill: [u8; 4],
    /// Output pixels per canvas pixel for saved and exported images
    #[serde(default = "default_export_scale")]
    pub export_scale: f32,
}

/// Largest edge, in pixels, of any rendered stage.
pub const MAX_EXPORT_EDGE: u32 = 8192;

fn default_export_scale() -> f32 {
    1.0
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            auto_crop_max_dimension: 650,
            auto_crop_step: 2,
            auto_crop_threshold: 18.0,
            auto_crop_alpha_floor: 8,
            auto_crop_pad_x: 0.045,
            auto_crop_pad_y: 0.03,
            auto_crop_max_aspect: 0.90,
            neutral_fill: [236, 236, 236, 255],
            export_scale: default_export_scale(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Garment catalog keyed by garment type
    #[serde(default = "default_catalog")]
    pub garments: BTreeMap<String, GarmentSpec>,
    /// Background photo location
    #[serde(default)]
    pub backgrounds: BackgroundSettings,
    /// Designer tuning
    #[serde(default)]
    pub designer: DesignerSettings,
    /// Capture tuning
    #[serde(default)]
    pub capture: CaptureSettings,
}

fn colors(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

fn default_catalog() -> BTreeMap<String, GarmentSpec> {
    let mut garments = BTreeMap::new();
    garments.insert(
        "men".to_string(),
        GarmentSpec {
            display_name: "Men's T-Shirt".to_string(),
            print_area: SideOverrides::uniform(InchSize::new(16.0, 20.0)),
            anchor: Anchor { x: 0.5, y: 0.52 },
            margin: SideOverrides::uniform(0.92),
            price: PriceTier {
                one_side: 2500,
                both_sides: 3500,
            },
            colors: colors(&["white", "black", "navy", "heather-grey"]),
        },
    );
    garments.insert(
        "women".to_string(),
        GarmentSpec {
            display_name: "Women's T-Shirt".to_string(),
            print_area: SideOverrides::uniform(InchSize::new(14.0, 18.0)),
            anchor: Anchor { x: 0.5, y: 0.5 },
            margin: SideOverrides::uniform(0.9),
            price: PriceTier {
                one_side: 2500,
                both_sides: 3500,
            },
            colors: colors(&["white", "black", "pink"]),
        },
    );
    garments.insert(
        "kids".to_string(),
        GarmentSpec {
            display_name: "Kids' T-Shirt".to_string(),
            print_area: SideOverrides::uniform(InchSize::new(10.0, 12.0)),
            anchor: Anchor { x: 0.5, y: 0.5 },
            margin: SideOverrides::uniform(0.9),
            price: PriceTier {
                one_side: 1900,
                both_sides: 2700,
            },
            colors: colors(&["white", "yellow", "sky"]),
        },
    );
    garments.insert(
        "hoodie".to_string(),
        GarmentSpec {
            display_name: "Hoodie".to_string(),
            print_area: SideOverrides {
                default: InchSize::new(14.0, 16.0),
                front: Some(InchSize::new(12.0, 8.0)),
                back: None,
            },
            anchor: Anchor { x: 0.5, y: 0.45 },
            margin: SideOverrides {
                default: 0.9,
                front: None,
                back: Some(0.92),
            },
            price: PriceTier {
                one_side: 4200,
                both_sides: 5600,
            },
            colors: colors(&["black", "charcoal", "white"]),
        },
    );
    garments
}

impl Default for Config {
    fn default() -> Self {
        Self {
            garments: default_catalog(),
            backgrounds: BackgroundSettings::default(),
            designer: DesignerSettings::default(),
            capture: CaptureSettings::default(),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config path (`<config dir>/garmentkit/config.toml`)
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("garmentkit").join("config.toml"))
            .ok_or(SettingsError::NoConfigDirectory)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match extension(path) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(SettingsError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        config.validate()?;
        tracing::debug!(
            "Loaded config from {} ({} garment types)",
            path.display(),
            config.garments.len()
        );
        Ok(config)
    }

    /// Load config from the platform path, or defaults if it does not exist
    pub fn load_or_default() -> SettingsResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            _ => {
                return Err(SettingsError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let write_error = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, content).map_err(write_error)?;
        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Look up a garment type
    pub fn garment(&self, garment: &str) -> ConfigResult<&GarmentSpec> {
        self.garments
            .get(garment)
            .ok_or_else(|| ConfigError::UnknownGarment(garment.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.garments.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        for (name, spec) in &self.garments {
            for (side, size) in spec.print_area.values() {
                if !(size.width > 0.0 && size.height > 0.0)
                    || !size.width.is_finite()
                    || !size.height.is_finite()
                {
                    return Err(out_of_range(
                        format!("garments.{}.print_area.{}", name, side),
                        format!("{}x{}", size.width, size.height),
                    ));
                }
            }

            for (side, margin) in spec.margin.values() {
                if !(*margin > 0.0 && *margin <= 1.0) {
                    return Err(out_of_range(
                        format!("garments.{}.margin.{}", name, side),
                        margin.to_string(),
                    ));
                }
            }

            for (axis, value) in [("x", spec.anchor.x), ("y", spec.anchor.y)] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(out_of_range(
                        format!("garments.{}.anchor.{}", name, axis),
                        value.to_string(),
                    ));
                }
            }

            if spec.price.both_sides < spec.price.one_side {
                return Err(out_of_range(
                    format!("garments.{}.price.both_sides", name),
                    spec.price.both_sides.to_string(),
                ));
            }
        }

        if !self.garments.contains_key(&self.designer.default_garment) {
            return Err(ConfigError::UnknownGarment(
                self.designer.default_garment.clone(),
            ));
        }

        if self.designer.dpi <= 0.0 {
            return Err(out_of_range("designer.dpi", self.designer.dpi.to_string()));
        }

        if self.designer.canvas_width <= 0.0 || self.designer.canvas_height <= 0.0 {
            return Err(out_of_range(
                "designer.canvas",
                format!(
                    "{}x{}",
                    self.designer.canvas_width, self.designer.canvas_height
                ),
            ));
        }

        if self.designer.history_limit == 0 {
            return Err(out_of_range("designer.history_limit", "0"));
        }

        if self.capture.auto_crop_step == 0 {
            return Err(out_of_range("capture.auto_crop_step", "0"));
        }

        if self.capture.auto_crop_max_dimension == 0 {
            return Err(out_of_range("capture.auto_crop_max_dimension", "0"));
        }

        // The scaled canvas must still fit a render stage.
        let scale = self.capture.export_scale as f64;
        let longest = self.designer.canvas_width.max(self.designer.canvas_height) * scale;
        if !(scale.is_finite() && scale > 0.0 && longest.round() <= MAX_EXPORT_EDGE as f64) {
            return Err(out_of_range(
                "capture.export_scale",
                self.capture.export_scale.to_string(),
            ));
        }

        if self.capture.auto_crop_max_aspect <= 0.0 {
            return Err(out_of_range(
                "capture.auto_crop_max_aspect",
                self.capture.auto_crop_max_aspect.to_string(),
            ));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn out_of_range(key: impl Into<String>, value: impl Into<String>) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.into(),
        value: value.into(),
    }
}
