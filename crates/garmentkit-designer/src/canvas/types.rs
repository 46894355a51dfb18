//! Canvas type definitions: SceneObject, ObjectKind, Content, ObjectTransform, Background.

use crate::clip::ClipId;
use crate::print_area::PrintArea;
use image::RgbaImage;
use std::rc::Rc;

/// Straight (non-premultiplied) RGBA color.
pub type Rgba = [u8; 4];

/// Placement of an object. `left`/`top` is the object's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees, clockwise.
    pub angle: f64,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

impl ObjectTransform {
    /// Unscaled, unrotated placement centered at `(left, top)`.
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            ..Default::default()
        }
    }
}

/// Text artwork.
#[derive(Debug, Clone, PartialEq)]
pub struct TextObject {
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub fill: Rgba,
}

impl TextObject {
    pub fn new(text: impl Into<String>, font_family: impl Into<String>, font_size: f64) -> Self {
        Self {
            text: text.into(),
            font_family: font_family.into(),
            font_size,
            fill: [0, 0, 0, 255],
        }
    }

    /// Approximate layout box for the text before any glyphs are measured.
    pub fn estimated_size(&self) -> (f64, f64) {
        let lines: Vec<&str> = self.text.lines().collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let line_count = lines.len().max(1);
        (
            longest as f64 * self.font_size * 0.6,
            line_count as f64 * self.font_size * 1.2,
        )
    }
}

/// An image reference plus its decoded pixels once loaded.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub src: String,
    pub pixels: Option<Rc<RgbaImage>>,
}

impl ImageData {
    pub fn new(src: impl Into<String>, pixels: Option<Rc<RgbaImage>>) -> Self {
        Self {
            src: src.into(),
            pixels,
        }
    }

    /// Natural size in pixels, or zero while the pixels are not loaded.
    pub fn dimensions(&self) -> (f64, f64) {
        self.pixels
            .as_ref()
            .map(|p| (p.width() as f64, p.height() as f64))
            .unwrap_or((0.0, 0.0))
    }
}

impl PartialEq for ImageData {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src
    }
}

/// User artwork.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(TextObject),
    Image(ImageData),
}

/// Dashed outline drawn over the print area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBorder {
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub dash: [f32; 2],
}

impl Default for ClipBorder {
    fn default() -> Self {
        Self {
            stroke: [120, 120, 120, 220],
            stroke_width: 2.0,
            dash: [8.0, 6.0],
        }
    }
}

/// What an object is. Only `Content` is design data; masks shape the clip
/// and borders are presentation only.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Content(Content),
    Mask(ImageData),
    ClipBorder(ClipBorder),
}

/// Discriminant of [`ObjectKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    Content,
    Mask,
    ClipBorder,
}

/// An object on the canvas. Stack order is its index in the canvas list.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: u64,
    pub transform: ObjectTransform,
    /// Intrinsic width, before scaling.
    pub width: f64,
    /// Intrinsic height, before scaling.
    pub height: f64,
    pub opacity: f64,
    pub visible: bool,
    pub selectable: bool,
    pub evented: bool,
    pub exclude_from_export: bool,
    pub absolute_positioned: bool,
    /// Clip the object is drawn through. Managed by the clip engine.
    pub clip: Option<ClipId>,
    pub kind: ObjectKind,
}

impl SceneObject {
    fn with_kind(kind: ObjectKind, transform: ObjectTransform, width: f64, height: f64) -> Self {
        Self {
            id: 0,
            transform,
            width,
            height,
            opacity: 1.0,
            visible: true,
            selectable: true,
            evented: true,
            exclude_from_export: false,
            absolute_positioned: false,
            clip: None,
            kind,
        }
    }

    /// Text object centered at `(left, top)`.
    pub fn text(text: TextObject, left: f64, top: f64) -> Self {
        let (width, height) = text.estimated_size();
        Self::with_kind(
            ObjectKind::Content(Content::Text(text)),
            ObjectTransform::at(left, top),
            width,
            height,
        )
    }

    /// Image object centered at `(left, top)`, sized to its pixels.
    pub fn image(image: ImageData, left: f64, top: f64) -> Self {
        let (width, height) = image.dimensions();
        Self::with_kind(
            ObjectKind::Content(Content::Image(image)),
            ObjectTransform::at(left, top),
            width,
            height,
        )
    }

    /// Mask silhouette centered at `(left, top)`. Masks are positioned in
    /// absolute canvas coordinates and are not interactive.
    pub fn mask(image: ImageData, left: f64, top: f64) -> Self {
        let (width, height) = image.dimensions();
        let mut object = Self::with_kind(
            ObjectKind::Mask(image),
            ObjectTransform::at(left, top),
            width,
            height,
        );
        object.absolute_positioned = true;
        object.selectable = false;
        object.evented = false;
        object
    }

    /// Dashed border outlining `area`.
    pub fn clip_border(area: &PrintArea, style: ClipBorder) -> Self {
        let mut object = Self::with_kind(
            ObjectKind::ClipBorder(style),
            ObjectTransform::at(area.left, area.top),
            area.width,
            area.height,
        );
        object.selectable = false;
        object.evented = false;
        object.exclude_from_export = true;
        object.absolute_positioned = true;
        object
    }

    /// How the object takes part in clipping and export.
    pub fn role(&self) -> ObjectRole {
        match self.kind {
            ObjectKind::Content(_) => ObjectRole::Content,
            ObjectKind::Mask(_) => ObjectRole::Mask,
            ObjectKind::ClipBorder(_) => ObjectRole::ClipBorder,
        }
    }

    /// User artwork: text or an image that is not a mask.
    pub fn is_content(&self) -> bool {
        self.role() == ObjectRole::Content
    }

    /// An image confirmed as a clipping mask.
    pub fn is_mask(&self) -> bool {
        self.role() == ObjectRole::Mask
    }

    pub fn is_clip_border(&self) -> bool {
        self.role() == ObjectRole::ClipBorder
    }

    /// Rendered size after scaling.
    pub fn scaled_size(&self) -> (f64, f64) {
        (
            self.width * self.transform.scale_x.abs(),
            self.height * self.transform.scale_y.abs(),
        )
    }
}

/// Canvas background: a garment photo and/or a flat color.
#[derive(Debug, Clone, Default)]
pub struct Background {
    pub url: Option<String>,
    pub image: Option<Rc<RgbaImage>>,
    pub color: Option<Rgba>,
}

impl Background {
    pub fn from_image(url: impl Into<String>, image: Rc<RgbaImage>) -> Self {
        Self {
            url: Some(url.into()),
            image: Some(image),
            color: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.color.is_none()
    }
}
