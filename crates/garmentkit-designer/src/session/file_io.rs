//! Saving, exporting and restoring designs.

use super::{DesignerSession, FALLBACK_COLOR};
use crate::capture::encode_png;
use crate::history::HistoryManager;
use crate::pricing::Quote;
use crate::serialization::SceneDocument;
use crate::transition::{TransitionOutcome, TransitionRequest, TransitionToken};
use crate::variant_store::{StoredScenes, VariantStateStore};
use chrono::{DateTime, Utc};
use garmentkit_core::{
    CaptureError, DesignEvent, DesignerEvent, DeserializationError, Side, Variant,
};
use garmentkit_settings::ConfigResult;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Current session snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Captures of one garment, per side. Sides without artwork are `None`.
#[derive(Debug, Clone, Default)]
pub struct SavedImages {
    /// Full mockup of the front: garment photo with the design on top.
    pub front: Option<RgbaImage>,
    pub back: Option<RgbaImage>,
    /// Transparent design-only layer of the front.
    pub front_mask: Option<RgbaImage>,
    pub back_mask: Option<RgbaImage>,
}

impl SavedImages {
    fn slot_mut(&mut self, side: Side) -> (&mut Option<RgbaImage>, &mut Option<RgbaImage>) {
        match side {
            Side::Front => (&mut self.front, &mut self.front_mask),
            Side::Back => (&mut self.back, &mut self.back_mask),
        }
    }

    fn slot(&self, side: Side) -> (Option<&RgbaImage>, Option<&RgbaImage>) {
        match side {
            Side::Front => (self.front.as_ref(), self.front_mask.as_ref()),
            Side::Back => (self.back.as_ref(), self.back_mask.as_ref()),
        }
    }
}

/// Result of [`DesignerSession::save_design`].
#[derive(Debug, Clone)]
pub struct SavedDesign {
    pub garment: String,
    pub images: SavedImages,
    /// `None` blocks checkout: nothing is printed.
    pub price: Option<Quote>,
}

impl SavedDesign {
    /// Sides with a captured image, front first.
    pub fn sides(&self) -> Vec<Side> {
        Side::ALL
            .into_iter()
            .filter(|side| self.images.slot(*side).0.is_some())
            .collect()
    }
}

/// Failure to write or read a session snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Snapshot scene for '{garment}' is unusable: {source}")]
    Scene {
        garment: String,
        #[source]
        source: DeserializationError,
    },

    #[error("Snapshot selects unknown garment type '{0}'")]
    UnknownGarment(String),
}

/// Everything needed to resume a session: the selection and every stored
/// scene. History is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub variant: Variant,
    #[serde(default)]
    pub scenes: BTreeMap<String, StoredScenes>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version == 0 || snapshot.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        for (garment, scenes) in &snapshot.scenes {
            for doc in [&scenes.front, &scenes.back].into_iter().flatten() {
                doc.check_version().map_err(|source| SnapshotError::Scene {
                    garment: garment.clone(),
                    source,
                })?;
            }
        }
        Ok(snapshot)
    }

    /// Write the snapshot as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Garment types with artwork on at least one side.
    pub fn designed_garments(&self) -> Vec<&str> {
        self.scenes
            .iter()
            .filter(|(_, scenes)| {
                [&scenes.front, &scenes.back]
                    .into_iter()
                    .flatten()
                    .any(SceneDocument::has_content)
            })
            .map(|(garment, _)| garment.as_str())
            .collect()
    }
}

impl DesignerSession {
    /// Capture every side of the selected garment that has artwork, at the
    /// configured export scale.
    ///
    /// Sides are brought onto the canvas in turn, starting with the one on
    /// screen, and the starting side is shown again afterwards, also when a
    /// capture fails. If the user switches variant while this runs, the save
    /// stops with [`CaptureError::Interrupted`] and leaves the user's choice
    /// alone.
    pub async fn save_design(&self) -> Result<SavedDesign, CaptureError> {
        self.save_design_at(self.capture.settings().export_scale).await
    }

    /// [`DesignerSession::save_design`] with output pixels per canvas pixel
    /// chosen by the caller.
    pub async fn save_design_at(&self, scale: f32) -> Result<SavedDesign, CaptureError> {
        self.commit_now();
        let start = self.variant();
        let garment = start.garment.clone();

        let mut issued: Option<TransitionToken> = None;
        let captured = self.capture_sides(&start, scale, &mut issued).await;

        let returned = match (&captured, issued) {
            (Err(CaptureError::Interrupted), _) | (_, None) => Ok(()),
            (_, Some(_)) => self.show_for_capture(&start, &mut issued).await,
        };
        let images = captured?;
        returned?;

        let price = self.quote_for(&garment);
        let saved = SavedDesign {
            garment,
            images,
            price,
        };
        tracing::info!(
            "Saved design for '{}' ({} sides)",
            saved.garment,
            saved.sides().len()
        );
        self.events
            .publish(DesignerEvent::Design(DesignEvent::Saved {
                garment: saved.garment.clone(),
                sides: saved.sides(),
                subtotal: price.map(|q| q.subtotal),
            }));
        Ok(saved)
    }

    async fn capture_sides(
        &self,
        start: &Variant,
        scale: f32,
        issued: &mut Option<TransitionToken>,
    ) -> Result<SavedImages, CaptureError> {
        let mut images = SavedImages::default();
        for side in [start.side, start.side.other()] {
            if !self.side_has_content(&start.garment, side) {
                continue;
            }
            self.show_for_capture(&start.with_side(side), issued).await?;

            let mut canvas = self.canvas.borrow_mut();
            let fonts = self.fonts.borrow();
            let full = self.capture.capture_full_mockup(&mut canvas, &fonts, scale)?;
            let design = self.capture.capture_design_only(&mut canvas, &fonts, scale)?;
            let (full_slot, mask_slot) = images.slot_mut(side);
            *full_slot = Some(full);
            *mask_slot = Some(design);
            tracing::debug!("Captured {}/{}", start.garment, side.as_str());
        }
        Ok(images)
    }

    /// Make `target` the installed variant unless it already is.
    async fn show_for_capture(
        &self,
        target: &Variant,
        issued: &mut Option<TransitionToken>,
    ) -> Result<(), CaptureError> {
        if let Some(token) = *issued {
            if self.transitions.latest() != token {
                tracing::info!("Save interrupted by a newer variant change");
                return Err(CaptureError::Interrupted);
            }
        }
        if self.canvas_variant() == Some(target.key()) && self.variant() == *target {
            return Ok(());
        }
        let outcome = self
            .run_transition(TransitionRequest::navigate(target.clone()))
            .await;
        *issued = Some(outcome.token());
        if !outcome.is_completed() {
            tracing::info!("Save interrupted by a newer variant change");
            return Err(CaptureError::Interrupted);
        }
        Ok(())
    }

    /// Save the design and pack its PNGs into a zip archive laid out as
    /// `<side>/fullMockup.png` and `<side>/designOnly.png`.
    pub async fn export_archive(&self) -> Result<Vec<u8>, CaptureError> {
        let design = self.save_design().await?;
        let archive = |e: zip::result::ZipError| CaptureError::Archive {
            reason: e.to_string(),
        };

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut files = 0;
        for side in Side::ALL {
            let (full, design_only) = design.images.slot(side);
            for (name, image) in [("fullMockup.png", full), ("designOnly.png", design_only)] {
                let Some(image) = image else {
                    continue;
                };
                let png = encode_png(image)?;
                writer
                    .start_file(format!("{}/{}", side.as_str(), name), options)
                    .map_err(archive)?;
                writer
                    .write_all(&png)
                    .map_err(|e| CaptureError::Archive {
                        reason: e.to_string(),
                    })?;
                files += 1;
            }
        }
        let bytes = writer.finish().map_err(archive)?.into_inner();

        tracing::info!("Exported {} files ({} bytes)", files, bytes.len());
        self.events
            .publish(DesignerEvent::Design(DesignEvent::Exported { files }));
        Ok(bytes)
    }

    /// Replace a garment's stored scenes with previously saved ones and show
    /// the currently selected side of it. History of the garment restarts.
    pub async fn restore_design(
        &self,
        garment: &str,
        front: Option<SceneDocument>,
        back: Option<SceneDocument>,
    ) -> ConfigResult<TransitionOutcome> {
        let spec = self.config.garment(garment)?;
        self.commit_now();

        let current = self.variant();
        let color = if current.garment == garment {
            current.color.clone()
        } else {
            spec.default_color().unwrap_or(FALLBACK_COLOR).to_string()
        };
        let target = Variant::new(garment, color, current.side);

        {
            let mut store = self.store.borrow_mut();
            store.reset_garment(garment, &mut self.history.borrow_mut());
            if let Some(doc) = front {
                store.set(garment, Side::Front, doc);
            }
            if let Some(doc) = back {
                store.set(garment, Side::Back, doc);
            }
        }
        tracing::info!("Restoring saved design for '{}'", garment);
        Ok(self.run_transition(TransitionRequest::reload(target)).await)
    }

    /// Forget both sides of a garment along with their history. The canvas
    /// is rebuilt empty when the garment is on screen.
    pub async fn reset_garment(&self, garment: &str) -> Option<TransitionOutcome> {
        self.debouncer.cancel();
        self.store
            .borrow_mut()
            .reset_garment(garment, &mut self.history.borrow_mut());
        self.events
            .publish(DesignerEvent::Design(DesignEvent::Reset {
                garment: garment.to_string(),
            }));

        let current = self.variant();
        if current.garment != garment {
            return None;
        }
        Some(self.run_transition(TransitionRequest::reload(current)).await)
    }

    /// Snapshot of the selection and all stored scenes, live canvas included.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.commit_now();
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            variant: self.variant(),
            scenes: self.store.borrow().to_stored(),
        }
    }

    /// Write every stored side of every garment to `path`.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        let snapshot = self.snapshot();
        snapshot.save_to_file(path)?;
        tracing::info!("Session snapshot written to {}", path.display());
        Ok(())
    }

    /// Replace every stored scene with the snapshot's and show its variant.
    /// History starts over.
    pub async fn restore_snapshot(
        &self,
        snapshot: SessionSnapshot,
    ) -> Result<TransitionOutcome, SnapshotError> {
        if self.config.garment(&snapshot.variant.garment).is_err() {
            return Err(SnapshotError::UnknownGarment(snapshot.variant.garment));
        }
        self.debouncer.cancel();
        *self.store.borrow_mut() = VariantStateStore::from_stored(snapshot.scenes);
        *self.history.borrow_mut() = HistoryManager::new(self.config.designer.history_limit);
        tracing::info!(
            "Restoring snapshot from {} on {}",
            snapshot.saved_at,
            snapshot.variant.key()
        );
        Ok(self
            .run_transition(TransitionRequest::reload(snapshot.variant))
            .await)
    }

    /// Replace the stored scenes with those in `path` and reload the current variant.
    pub async fn load_snapshot(&self, path: &Path) -> Result<TransitionOutcome, SnapshotError> {
        let snapshot = SessionSnapshot::load_from_file(path)?;
        self.restore_snapshot(snapshot).await
    }
}
