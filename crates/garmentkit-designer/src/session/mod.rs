//! Designer session: one canvas shared by every garment variant.
//!
//! The session owns the canvas, the clip engine, per-variant history and the
//! stored scenes, and rebuilds the canvas whenever the selected variant
//! changes. Everything runs on one thread; state lives in `RefCell`s and no
//! borrow is held across an `.await`.

mod editing;
mod file_io;
mod transition;

pub use file_io::{SavedDesign, SavedImages, SessionSnapshot, SnapshotError, SNAPSHOT_VERSION};

use crate::assets::{AssetCache, AssetLoader};
use crate::canvas::Canvas;
use crate::capture::CaptureService;
use crate::clip::ClipEngine;
use crate::debounce::EditDebouncer;
use crate::font_manager::FontRegistry;
use crate::history::HistoryManager;
use crate::pricing::{PricingResolver, Quote};
use crate::print_area::PrintAreaCalculator;
use crate::serialization::{SceneCodec, SceneDocument};
use crate::transition::TransitionController;
use crate::variant_store::VariantStateStore;
use garmentkit_core::{DesignerEvent, EventBus, HistoryEvent, Side, Variant, VariantKey};
use garmentkit_settings::{Config, ConfigResult};
use std::cell::{Ref, RefCell};
use std::rc::Rc;

const FALLBACK_COLOR: &str = "white";

#[derive(Debug, Clone)]
struct SessionState {
    /// Selection the user asked for most recently.
    variant: Variant,
    /// Variant whose scene is fully installed on the canvas. `None` while a
    /// rebuild is in flight.
    canvas_key: Option<VariantKey>,
    /// The stored scene for `canvas_key` failed to decode and nothing has
    /// been edited since, so the canvas must not overwrite it.
    degraded: bool,
}

/// Headless garment designer.
pub struct DesignerSession {
    config: Config,
    canvas: RefCell<Canvas>,
    clip: RefCell<ClipEngine>,
    history: RefCell<HistoryManager>,
    store: RefCell<VariantStateStore>,
    state: RefCell<SessionState>,
    transitions: TransitionController,
    debouncer: EditDebouncer,
    assets: Rc<AssetCache>,
    codec: SceneCodec,
    fonts: RefCell<FontRegistry>,
    capture: CaptureService,
    pricing: PricingResolver,
    events: EventBus,
}

impl DesignerSession {
    /// Creates a session on the configured default garment, its first color
    /// and the front side. Call [`DesignerSession::initialize`] before use.
    pub fn new(config: Config, loader: Rc<dyn AssetLoader>) -> ConfigResult<Self> {
        config.validate()?;

        let garment = config.designer.default_garment.clone();
        let color = config
            .garment(&garment)?
            .default_color()
            .unwrap_or(FALLBACK_COLOR)
            .to_string();

        let assets = Rc::new(AssetCache::new(loader));
        let designer = &config.designer;

        Ok(Self {
            canvas: RefCell::new(Canvas::new(designer.canvas_width, designer.canvas_height)),
            clip: RefCell::new(ClipEngine::new(PrintAreaCalculator::new(&config))),
            history: RefCell::new(HistoryManager::new(designer.history_limit)),
            store: RefCell::new(VariantStateStore::new()),
            state: RefCell::new(SessionState {
                variant: Variant::new(garment, color, Side::Front),
                canvas_key: None,
                degraded: false,
            }),
            transitions: TransitionController::new(),
            debouncer: EditDebouncer::from_millis(designer.debounce_ms),
            codec: SceneCodec::new(Rc::clone(&assets)),
            assets,
            fonts: RefCell::new(FontRegistry::new(designer.default_font_family.clone())),
            capture: CaptureService::new(config.capture.clone()),
            pricing: PricingResolver::new(&config),
            events: EventBus::new(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The live canvas. Do not hold the borrow across an await.
    pub fn canvas(&self) -> Ref<'_, Canvas> {
        self.canvas.borrow()
    }

    /// Bus carrying transition, history and design events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn assets(&self) -> &Rc<AssetCache> {
        &self.assets
    }

    pub fn clip_engine(&self) -> Ref<'_, ClipEngine> {
        self.clip.borrow()
    }

    /// Per-variant undo history.
    pub fn history(&self) -> Ref<'_, HistoryManager> {
        self.history.borrow()
    }

    pub fn fonts(&self) -> Ref<'_, FontRegistry> {
        self.fonts.borrow()
    }

    /// Currently selected variant.
    pub fn variant(&self) -> Variant {
        self.state.borrow().variant.clone()
    }

    /// Variant whose scene is installed on the canvas, if no rebuild is in flight.
    pub fn canvas_variant(&self) -> Option<VariantKey> {
        self.state.borrow().canvas_key.clone()
    }

    /// Whether a canvas rebuild is in progress.
    pub fn is_restoring(&self) -> bool {
        self.transitions.is_restoring()
    }

    /// Stored scene of a variant.
    pub fn stored_scene(&self, garment: &str, side: Side) -> Option<Rc<SceneDocument>> {
        self.store.borrow().get(garment, side)
    }

    /// Whether the current variant has something to undo.
    pub fn can_undo(&self) -> bool {
        let key = self.variant().key();
        self.history.borrow().can_undo(&key)
    }

    pub fn can_redo(&self) -> bool {
        let key = self.variant().key();
        self.history.borrow().can_redo(&key)
    }

    /// Record the live canvas as the present state of its variant.
    ///
    /// Does nothing while a rebuild is in progress, when no variant is
    /// installed, or when the canvas shows a scene that failed to load.
    pub fn commit_now(&self) {
        self.debouncer.cancel();
        if self.transitions.is_restoring() {
            tracing::trace!("Commit skipped while restoring");
            return;
        }
        let key = {
            let state = self.state.borrow();
            match &state.canvas_key {
                Some(key) if !state.degraded => key.clone(),
                _ => return,
            }
        };
        self.commit_canvas(&key);
    }

    fn commit_canvas(&self, key: &VariantKey) {
        let doc = SceneCodec::serialize(&self.canvas.borrow());
        self.store.borrow_mut().set(&key.garment, key.side, doc.clone());
        let outcome = self.history.borrow_mut().commit(key, doc);
        tracing::trace!("Commit {}: {:?}", key, outcome);
        self.publish_history(key);
    }

    fn publish_history(&self, key: &VariantKey) {
        let (can_undo, can_redo) = {
            let history = self.history.borrow();
            (history.can_undo(key), history.can_redo(key))
        };
        self.events
            .publish(DesignerEvent::History(HistoryEvent::Changed {
                key: key.clone(),
                can_undo,
                can_redo,
            }));
    }

    /// Whether a side of a garment carries artwork. The live canvas answers
    /// for the variant it shows; other variants answer from the store.
    pub fn side_has_content(&self, garment: &str, side: Side) -> bool {
        let live = {
            let state = self.state.borrow();
            state
                .canvas_key
                .as_ref()
                .is_some_and(|key| key.garment == garment && key.side == side)
        };
        if live {
            self.canvas.borrow().has_content()
        } else {
            self.store.borrow().has_content(garment, side)
        }
    }

    /// Price of the selected garment's design, or `None` when nothing is
    /// printed yet.
    pub fn quote(&self) -> Option<Quote> {
        let garment = self.variant().garment;
        self.quote_for(&garment)
    }

    /// Price for `garment` given which of its sides carry artwork.
    pub fn quote_for(&self, garment: &str) -> Option<Quote> {
        let front = self.side_has_content(garment, Side::Front);
        let back = self.side_has_content(garment, Side::Back);
        self.pricing.price(garment, front, back)
    }
}
