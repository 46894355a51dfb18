//! Error handling for GarmentKit
//!
//! Provides the error taxonomy shared by every layer of the designer:
//! - Geometry errors (degenerate canvas or print-area input)
//! - Deserialization errors (stored scenes that cannot be restored)
//! - Image load errors (background, artwork and font assets)
//! - Capture errors (raster export of the design or mockup)
//!
//! Only capture errors are meant to reach the end user. The others are
//! recovered from inside the designer and logged.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// The print-area math clamps its inputs, so this only surfaces from
/// validation of configuration or caller-provided canvas sizes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Canvas has a zero, negative or non-finite dimension
    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas {
        /// The canvas width in pixels.
        width: f64,
        /// The canvas height in pixels.
        height: f64,
    },

    /// Print area has a zero, negative or non-finite dimension
    #[error("Invalid print area for '{garment}': {reason}")]
    InvalidPrintArea {
        /// The garment type the print area belongs to.
        garment: String,
        /// The reason the print area is invalid.
        reason: String,
    },
}

/// Deserialization error type
///
/// Represents stored scenes that are malformed or written by an
/// incompatible version. Always recoverable: the scene content is dropped
/// while background and clip are preserved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeserializationError {
    /// Document was written by a newer, unknown format version
    #[error("Unsupported scene version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// The version found in the document.
        found: u32,
        /// The newest version this build understands.
        supported: u32,
    },

    /// Object record carries an unknown type tag
    #[error("Unknown object type '{object_type}' at index {index}")]
    UnknownObjectType {
        /// Position of the record in the document.
        index: usize,
        /// The unrecognized type tag.
        object_type: String,
    },

    /// Object record is missing data its type requires
    #[error("Malformed object at index {index}: {reason}")]
    MalformedRecord {
        /// Position of the record in the document.
        index: usize,
        /// What is wrong with the record.
        reason: String,
    },

    /// Document text is not valid JSON for a scene
    #[error("Invalid scene JSON: {0}")]
    Json(String),

    /// An image referenced by the document could not be loaded
    #[error("Asset '{src}' unavailable: {reason}")]
    AssetUnavailable {
        /// The image source reference.
        src: String,
        /// The underlying load failure.
        reason: String,
    },
}

impl From<serde_json::Error> for DeserializationError {
    fn from(err: serde_json::Error) -> Self {
        DeserializationError::Json(err.to_string())
    }
}

/// Image load error type
///
/// Network, filesystem or decode failures from the asset loader.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageLoadError {
    /// Nothing exists at the requested location
    #[error("Image not found: {url}")]
    NotFound {
        /// The requested URL.
        url: String,
    },

    /// Reading the asset failed
    #[error("Failed to read {url}: {reason}")]
    Io {
        /// The requested URL.
        url: String,
        /// The reason the read failed.
        reason: String,
    },

    /// Asset bytes are not a decodable image
    #[error("Failed to decode {url}: {reason}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The decoder error.
        reason: String,
    },

    /// URL scheme is not handled by this loader
    #[error("Unsupported asset URL: {url}")]
    Unsupported {
        /// The requested URL.
        url: String,
    },
}

/// Capture error type
///
/// Raised when producing design-only or mockup rasters fails. These are
/// the only errors surfaced to the end user (a failed export can be retried).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Output surface would have a zero or oversized dimension
    #[error("Cannot allocate a {width}x{height} capture surface")]
    EmptyStage {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Encoding the raster failed
    #[error("Failed to encode capture: {reason}")]
    Encode {
        /// The encoder error.
        reason: String,
    },

    /// A newer variant switch superseded the capture sequence
    #[error("Capture interrupted by a newer variant switch")]
    Interrupted,

    /// Both the deterministic path and the stage fallback failed
    #[error("Mockup capture failed ({primary}); fallback failed ({fallback})")]
    FallbackFailed {
        /// Failure of the deterministic compositing path.
        primary: String,
        /// Failure of the stage fallback.
        fallback: String,
    },

    /// Archive packaging failed
    #[error("Archive error: {reason}")]
    Archive {
        /// The archive writer error.
        reason: String,
    },
}

/// Main error type for GarmentKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Deserialization error
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    /// Image load error
    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),

    /// Capture error
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a capture error (the only user-actionable class)
    pub fn is_capture_error(&self) -> bool {
        matches!(self, Error::Capture(_))
    }

    /// Check if the designer recovers from this error on its own
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Geometry(_) | Error::Deserialization(_) | Error::ImageLoad(_)
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
