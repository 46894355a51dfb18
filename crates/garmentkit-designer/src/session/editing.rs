//! Canvas edits, masks and fonts.
//!
//! Discrete actions (adding, removing, confirming a mask) commit at once.
//! Continuous gestures go through [`DesignerSession::edit`] followed by
//! [`DesignerSession::note_edit`], which commits after the quiet period.

use super::DesignerSession;
use crate::canvas::{Canvas, Content, ObjectKind, SceneObject, TextObject};
use crate::font_manager::FontSource;
use crate::renderer::{render_canvas, RenderOptions};
use garmentkit_core::{CaptureError, ImageLoadError};
use image::RgbaImage;

impl DesignerSession {
    /// Mutate the live canvas. Returns `None` without calling `f` while no
    /// variant is installed (a rebuild is in flight).
    ///
    /// Afterwards the clip is recomposed from the masks left on the canvas,
    /// so moving or deleting a mask reshapes what the artwork is clipped to.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Canvas) -> R) -> Option<R> {
        if self.state.borrow().canvas_key.is_none() {
            tracing::debug!("Edit ignored while the canvas is being rebuilt");
            return None;
        }
        let result = {
            let mut canvas = self.canvas.borrow_mut();
            let result = f(&mut canvas);
            let mut clip = self.clip.borrow_mut();
            if clip.resync(&mut canvas).is_none() {
                clip.bring_border_to_front(&mut canvas);
            }
            canvas.request_render();
            result
        };
        self.state.borrow_mut().degraded = false;
        Some(result)
    }

    /// Schedule a history commit for the latest edit.
    ///
    /// Resolves once the quiet period is over. Returns `true` if this call
    /// committed; a newer edit, an explicit commit or a variant switch in
    /// the meantime makes it return `false`.
    pub async fn note_edit(&self) -> bool {
        if self.transitions.is_restoring() {
            return false;
        }
        self.state.borrow_mut().degraded = false;
        let ticket = self.debouncer.ticket();
        if !self.debouncer.settle(ticket).await {
            return false;
        }
        if self.transitions.is_restoring() {
            return false;
        }
        let Some(key) = self.canvas_variant() else {
            return false;
        };
        self.commit_canvas(&key);
        true
    }

    /// Place text at the center of the print area.
    pub fn add_text(&self, text: TextObject) -> Option<u64> {
        let id = self.edit(|canvas| {
            let (left, top) = placement(canvas);
            canvas.add_text(text, left, top)
        })?;
        self.commit_now();
        Some(id)
    }

    /// Load an image and place it at the center of the print area.
    ///
    /// Returns `Ok(None)` when the variant changed while the image loaded;
    /// the image is then not added anywhere.
    pub async fn add_image(&self, url: &str) -> Result<Option<u64>, ImageLoadError> {
        let Some(key) = self.canvas_variant() else {
            return Ok(None);
        };
        let pixels = self.assets.image(url).await?;
        if self.canvas_variant().as_ref() != Some(&key) {
            tracing::debug!("Dropping image '{}': {} is no longer on the canvas", url, key);
            return Ok(None);
        }
        let id = self.edit(|canvas| {
            let (left, top) = placement(canvas);
            canvas.add_image(url, pixels, left, top)
        });
        self.commit_now();
        Ok(id)
    }

    /// Delete an object and commit. Returns `false` if nothing was removed.
    pub fn remove_object(&self, id: u64) -> bool {
        let removed = self
            .edit(|canvas| canvas.remove(id).is_some())
            .unwrap_or(false);
        if removed {
            self.commit_now();
        }
        removed
    }

    /// Turn an image on the canvas into a clipping mask. The artwork is then
    /// clipped to both the print area and the mask's silhouette.
    pub fn confirm_mask(&self, id: u64) -> bool {
        let converted = self.edit(|canvas| {
            let object = canvas.get_mut(id)?;
            let ObjectKind::Content(Content::Image(image)) = &object.kind else {
                return None;
            };
            let mut mask = SceneObject::mask(
                image.clone(),
                object.transform.left,
                object.transform.top,
            );
            mask.transform = object.transform;
            mask.width = object.width;
            mask.height = object.height;
            mask.id = object.id;
            *object = mask;
            Some(())
        });
        if converted.flatten().is_none() {
            return false;
        }
        tracing::debug!("Object {} confirmed as mask", id);
        self.commit_now();
        true
    }

    /// Remove every mask and fall back to the print-area clip.
    pub fn clear_masks(&self) -> usize {
        let removed = self
            .edit(|canvas| canvas.remove_where(SceneObject::is_mask))
            .unwrap_or(0);
        if removed > 0 {
            self.commit_now();
        }
        removed
    }

    /// Make a font family available to text objects. Failures are logged and
    /// leave rendering on the fallback font.
    pub async fn register_font(&self, family: &str, source: FontSource) -> bool {
        let bytes = match source {
            FontSource::Bytes(bytes) => bytes,
            FontSource::Url(url) => match self.assets.loader().load_bytes(&url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Font '{}' could not be fetched: {}", family, e);
                    return false;
                }
            },
        };
        let registered = self.fonts.borrow_mut().register_bytes(family, bytes);
        if registered {
            self.canvas.borrow_mut().request_render();
        }
        registered
    }

    /// Render the stage as the user sees it, borders included.
    pub fn render_preview(&self, scale: f32) -> Result<RgbaImage, CaptureError> {
        let options = RenderOptions {
            scale,
            ..RenderOptions::default()
        };
        render_canvas(&self.canvas.borrow(), &self.fonts.borrow(), &options)
    }
}

fn placement(canvas: &Canvas) -> (f64, f64) {
    canvas
        .active_clip()
        .map(|clip| (clip.area.left, clip.area.top))
        .unwrap_or((canvas.width() / 2.0, canvas.height() / 2.0))
}
