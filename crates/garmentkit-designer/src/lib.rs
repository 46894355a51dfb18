//! # GarmentKit Designer
//!
//! Headless garment design session: one canvas shared by every garment
//! type and side, with per-variant scenes, per-variant undo/redo, print
//! area clipping and mockup capture.
//!
//! ## Core Components
//!
//! ### Scene
//! - **Canvas**: Ordered text, image, mask and border objects plus background
//! - **Print Area**: Garment-specific printable rectangle fitted to the canvas
//! - **Clip Engine**: Print-area clip, stacked mask clips and the dashed border
//! - **Serialization**: Versioned JSON scene documents
//!
//! ### Session
//! - **Variant Store**: Last committed scene of every garment/side
//! - **History**: Bounded undo/redo per variant with no-op suppression
//! - **Transitions**: Token-ordered canvas rebuilds; stale ones bail out
//! - **Debounce**: Quiet period before edits are committed
//!
//! ### Output
//! - **Renderer**: Rasterizes the canvas with tiny-skia
//! - **Capture**: Full mockups, design-only layers and auto-crop
//! - **Pricing**: Flat one-side / both-sides tiers
//!
//! ## Architecture
//!
//! ```text
//! DesignerSession
//!   ├── Canvas ── ClipEngine ── PrintAreaCalculator
//!   ├── VariantStateStore + HistoryManager
//!   ├── TransitionController + EditDebouncer
//!   ├── SceneCodec ── AssetCache ── AssetLoader
//!   └── CaptureService ── Renderer ── FontRegistry
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use garmentkit_designer::{DesignerSession, FileAssetLoader, TextObject};
//!
//! let session = DesignerSession::new(config, Rc::new(FileAssetLoader::new("assets")))?;
//! session.initialize().await;
//! session.add_text(TextObject::new("Hello", "Sans", 48.0));
//! session.on_side_changed(Side::Back).await;
//! let saved = session.save_design().await?;
//! ```

pub mod assets;
pub mod canvas;
pub mod capture;
pub mod clip;
pub mod debounce;
pub mod font_manager;
pub mod history;
pub mod pricing;
pub mod print_area;
pub mod renderer;
pub mod serialization;
pub mod session;
pub mod transition;
pub mod variant_store;

pub use assets::{AssetCache, AssetLoader, FileAssetLoader, MemoryAssetLoader};
pub use canvas::{
    Background, Canvas, ClipBorder, Content, ImageData, ObjectKind, ObjectRole, ObjectTransform,
    SceneObject, TextObject,
};
pub use capture::{encode_png, CaptureService};
pub use clip::{ClipEngine, ClipId, ClipRegion, ClipShape};
pub use debounce::EditDebouncer;
pub use font_manager::{list_system_families, FontRegistry, FontSource};
pub use history::{CommitOutcome, HistoryManager, DEFAULT_HISTORY_LIMIT};
pub use pricing::{PricedSides, PricingResolver, Quote};
pub use print_area::{PrintArea, PrintAreaCalculator};
pub use renderer::{render_canvas, RenderOptions};
pub use serialization::{LoadedScene, ObjectRecord, SceneCodec, SceneDocument, SCENE_FORMAT_VERSION};
pub use session::{
    DesignerSession, SavedDesign, SavedImages, SessionSnapshot, SnapshotError, SNAPSHOT_VERSION,
};
pub use transition::{
    HistoryStep, TransitionController, TransitionOutcome, TransitionRequest, TransitionToken,
};
pub use variant_store::{StoredScenes, VariantStateStore};
