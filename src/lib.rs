//! # GarmentKit
//!
//! A headless print designer for garments with:
//! - One shared canvas for every garment type, color and side
//! - Per-side scene state and per-side undo/redo
//! - Print-area clipping with stackable silhouette masks
//! - Full mockup and design-only captures, zip export and pricing
//!
//! ## Architecture
//!
//! GarmentKit is organized as a workspace with multiple crates:
//!
//! 1. **garmentkit-core** - Variant identity, events and error types
//! 2. **garmentkit-settings** - Garment catalog and designer tuning
//! 3. **garmentkit-designer** - Canvas, clipping, history, transitions, capture
//! 4. **garmentkit** - Command-line front end that integrates all crates

pub use garmentkit_core::data;
pub use garmentkit_designer as designer;
pub use garmentkit_settings as settings;

pub use garmentkit_core::{
    CaptureError, DeserializationError, DesignEvent, DesignerEvent, Error, EventBus,
    HistoryEvent, ImageLoadError, Result, Side, TransitionEvent, Variant, VariantKey,
};

pub use garmentkit_designer::{
    DesignerSession, FileAssetLoader, MemoryAssetLoader, Quote, SavedDesign, SessionSnapshot,
    TextObject, TransitionOutcome,
};

pub use garmentkit_settings::Config;

/// Build timestamp, set by the build script.
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatting on stderr, so stdout stays free for command output
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
