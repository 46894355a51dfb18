//! Clip regions constraining artwork to the printable area.
//!
//! The base clip is the fitted print-area rectangle for the active variant.
//! In mock-print mode the user can promote decorative overlay shapes to
//! masks; the composed clip is then the union of those silhouettes.
//!
//! Clips are environment, not data: stored scenes never reference one, so
//! the clip is rebuilt and re-applied every time a variant is shown.

use crate::canvas::{Canvas, ClipBorder, SceneObject};
use crate::print_area::{PrintArea, PrintAreaCalculator};
use garmentkit_core::Side;
use std::fmt;

/// Identity of a composed clip. Objects point at the clip they are drawn through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// Geometry of a clip, in absolute canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipShape {
    /// The fitted print-area rectangle.
    Rect(PrintArea),
    /// A single confirmed mask silhouette.
    Mask(Box<SceneObject>),
    /// Several stacked masks acting as one combined silhouette.
    Group(Vec<SceneObject>),
}

/// A clip applied to every artwork object of the active variant.
///
/// Clip regions are absolute-positioned and carry no interactivity; they
/// are never part of a persisted scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRegion {
    pub id: ClipId,
    pub shape: ClipShape,
    /// The print area this clip was built for.
    pub area: PrintArea,
}

/// Builds and recomposes the active clip.
#[derive(Debug, Clone)]
pub struct ClipEngine {
    calculator: PrintAreaCalculator,
    border_style: ClipBorder,
    base: Option<ClipRegion>,
    masks: Vec<SceneObject>,
    /// Result of the last compose, for the masks in `masks`.
    current: Option<ClipRegion>,
    next_id: u64,
}

impl ClipEngine {
    pub fn new(calculator: PrintAreaCalculator) -> Self {
        Self {
            calculator,
            border_style: ClipBorder::default(),
            base: None,
            masks: Vec::new(),
            current: None,
            next_id: 1,
        }
    }

    pub fn calculator(&self) -> &PrintAreaCalculator {
        &self.calculator
    }

    /// Print-area clip of the current variant, before masks.
    pub fn base(&self) -> Option<&ClipRegion> {
        self.base.as_ref()
    }

    /// Masks in the current composition.
    pub fn mask_count(&self) -> usize {
        self.masks.len()
    }

    fn issue_id(&mut self) -> ClipId {
        let id = ClipId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Build the print-area clip for a variant and place its dashed border on
    /// top of the canvas. Any previous border and stacked masks are dropped.
    ///
    /// Unknown garment types leave the canvas untouched and return `None`.
    pub fn create_base_clip(
        &mut self,
        canvas: &mut Canvas,
        garment: &str,
        side: Side,
    ) -> Option<ClipRegion> {
        let Some(area) =
            self.calculator
                .compute_fitted_rect(canvas.width(), canvas.height(), garment, side)
        else {
            tracing::warn!("No print area for garment '{}', clip left unchanged", garment);
            return None;
        };

        canvas.remove_where(SceneObject::is_clip_border);
        canvas.add(SceneObject::clip_border(&area, self.border_style));

        let region = ClipRegion {
            id: self.issue_id(),
            shape: ClipShape::Rect(area),
            area,
        };
        self.base = Some(region.clone());
        self.masks.clear();
        self.current = None;
        tracing::debug!(
            "Base clip {} for {}/{}: {:.1}x{:.1} at ({:.1}, {:.1})",
            region.id,
            garment,
            side.as_str(),
            area.width,
            area.height,
            area.left,
            area.top
        );
        Some(region)
    }

    /// Point every artwork object at `clip` and make it the canvas's active clip.
    ///
    /// Masks and borders are never clipped. Returns how many objects were re-pointed.
    pub fn apply_clip_to_objects(&self, canvas: &mut Canvas, clip: &ClipRegion) -> usize {
        canvas.set_active_clip(Some(clip.clone()));
        let mut applied = 0;
        for object in canvas.objects_mut() {
            if object.is_content() {
                object.clip = Some(clip.id);
                applied += 1;
            } else {
                object.clip = None;
            }
        }
        applied
    }

    /// Stack a mask on top of the current clip. Non-mask objects are rejected.
    pub fn push_mask(&mut self, mask: SceneObject) -> bool {
        if !mask.is_mask() {
            tracing::warn!("Ignoring non-mask object {} pushed as clip mask", mask.id);
            return false;
        }
        self.masks.push(mask);
        true
    }

    /// The clip artwork should currently be drawn through: the base clip when
    /// no masks are stacked, a single mask directly, or all masks grouped.
    pub fn compose_clip(&mut self) -> Option<ClipRegion> {
        let area = self.base.as_ref()?.area;
        let composed = match self.masks.len() {
            0 => self.base.clone(),
            1 => {
                let mask = self.masks[0].clone();
                Some(ClipRegion {
                    id: self.issue_id(),
                    shape: ClipShape::Mask(Box::new(mask)),
                    area,
                })
            }
            _ => {
                let group = self.masks.clone();
                Some(ClipRegion {
                    id: self.issue_id(),
                    shape: ClipShape::Group(group),
                    area,
                })
            }
        };
        self.current = composed.clone();
        composed
    }

    /// Lock every border non-interactive and raise it above all content.
    pub fn bring_border_to_front(&self, canvas: &mut Canvas) {
        let ids: Vec<u64> = canvas
            .objects()
            .iter()
            .filter(|o| o.is_clip_border())
            .map(|o| o.id)
            .collect();
        for id in ids {
            if let Some(border) = canvas.get_mut(id) {
                border.selectable = false;
                border.evented = false;
                border.exclude_from_export = true;
            }
            canvas.bring_to_front(id);
        }
    }

    /// Full clip rebuild for the variant now on the canvas: base clip, any
    /// masks present in the scene, re-pointing of all artwork, border on top.
    pub fn rebuild(&mut self, canvas: &mut Canvas, garment: &str, side: Side) -> Option<ClipRegion> {
        self.create_base_clip(canvas, garment, side)?;
        self.resync(canvas)
    }

    /// Bring the clip in line with the masks currently on the canvas, in
    /// canvas order, and re-point all artwork at it with the border on top.
    /// Masks moved, resized or removed since the last compose take effect
    /// here; an unchanged mask set keeps the current clip and its id.
    ///
    /// Returns `None` before a base clip exists.
    pub fn resync(&mut self, canvas: &mut Canvas) -> Option<ClipRegion> {
        self.base.as_ref()?;
        let masks: Vec<SceneObject> = canvas
            .objects()
            .iter()
            .filter(|o| o.is_mask())
            .cloned()
            .collect();

        let clip = match &self.current {
            Some(current) if masks == self.masks => current.clone(),
            _ => {
                self.masks = masks;
                self.compose_clip()?
            }
        };
        self.apply_clip_to_objects(canvas, &clip);
        self.bring_border_to_front(canvas);
        Some(clip)
    }
}
