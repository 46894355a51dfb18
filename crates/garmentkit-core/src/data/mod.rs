//! Data models for garment variants.
//!
//! A garment has three independent axes: its type (e.g. `men`, `hoodie`),
//! its color, and the printable side. Only type and side identify a design
//! scene; color changes the background photo and nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Printable side of a garment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Front of the garment
    Front,
    /// Back of the garment
    Back,
}

impl Side {
    /// Both sides, front first
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    /// Returns the opposite side.
    pub fn other(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Lowercase name used in URLs and archive paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl Default for Side {
    fn default() -> Self {
        Self::Front
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "Front"),
            Self::Back => write!(f, "Back"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "front" | "f" => Ok(Self::Front),
            "back" | "b" => Ok(Self::Back),
            _ => Err(format!("Unknown side: {}", s)),
        }
    }
}

/// Identity of one design scene: garment type plus side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    /// Garment type identifier (catalog key)
    pub garment: String,
    /// Printable side
    pub side: Side,
}

impl VariantKey {
    /// Creates a new variant key.
    pub fn new(garment: impl Into<String>, side: Side) -> Self {
        Self {
            garment: garment.into(),
            side,
        }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.garment, self.side.as_str())
    }
}

/// Full variant selection shown to the user: key plus color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    /// Garment type identifier
    pub garment: String,
    /// Garment color name
    pub color: String,
    /// Printable side
    pub side: Side,
}

impl Variant {
    /// Creates a new variant selection.
    pub fn new(garment: impl Into<String>, color: impl Into<String>, side: Side) -> Self {
        Self {
            garment: garment.into(),
            color: color.into(),
            side,
        }
    }

    /// Returns the scene key of this variant (color is not part of it).
    pub fn key(&self) -> VariantKey {
        VariantKey::new(self.garment.clone(), self.side)
    }

    /// Returns a copy with a different side.
    pub fn with_side(&self, side: Side) -> Self {
        Self {
            side,
            ..self.clone()
        }
    }
}
