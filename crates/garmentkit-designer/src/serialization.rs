//! Scene serialization.
//!
//! A [`SceneDocument`] is the engine-internal JSON form of one variant's
//! canvas. It is what the history stacks, the variant store and session
//! snapshots hold. Clip borders are presentation only and are never written;
//! masks are written with `is_mask_image` so mock-print mode survives a
//! round trip.

use crate::assets::AssetCache;
use crate::canvas::{
    Canvas, ClipBorder, Content, ImageData, ObjectKind, Rgba, SceneObject, TextObject,
};
use crate::print_area::PrintArea;
use garmentkit_core::DeserializationError;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Scene format version written by this build.
pub const SCENE_FORMAT_VERSION: u32 = 1;

const TYPE_TEXT: &str = "text";
const TYPE_IMAGE: &str = "image";
const TYPE_RECT: &str = "rect";

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

/// Serialized canvas scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub version: u32,
    /// Canvas width at capture time.
    pub width: f64,
    /// Canvas height at capture time.
    pub height: f64,
    /// Objects in stack order, topmost last.
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

/// Serialized object data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(rename = "type")]
    pub object_type: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default)]
    pub is_mask_image: bool,
    #[serde(default)]
    pub is_clip_border: bool,
    #[serde(default)]
    pub absolute_positioned: bool,
}

impl ObjectRecord {
    fn base(object_type: &str, object: &SceneObject) -> Self {
        Self {
            object_type: object_type.to_string(),
            left: object.transform.left,
            top: object.transform.top,
            width: object.width,
            height: object.height,
            scale_x: object.transform.scale_x,
            scale_y: object.transform.scale_y,
            angle: object.transform.angle,
            opacity: object.opacity,
            visible: object.visible,
            fill: None,
            text: None,
            font_family: None,
            font_size: None,
            src: None,
            is_mask_image: false,
            is_clip_border: false,
            absolute_positioned: object.absolute_positioned,
        }
    }

    /// Builds a record from a canvas object. Returns `None` for objects that
    /// are excluded from export.
    pub fn from_object(object: &SceneObject) -> Option<Self> {
        if object.exclude_from_export {
            return None;
        }
        let record = match &object.kind {
            ObjectKind::Content(Content::Text(text)) => Self {
                fill: Some(text.fill),
                text: Some(text.text.clone()),
                font_family: Some(text.font_family.clone()),
                font_size: Some(text.font_size),
                ..Self::base(TYPE_TEXT, object)
            },
            ObjectKind::Content(Content::Image(image)) => Self {
                src: Some(image.src.clone()),
                ..Self::base(TYPE_IMAGE, object)
            },
            ObjectKind::Mask(image) => Self {
                src: Some(image.src.clone()),
                is_mask_image: true,
                ..Self::base(TYPE_IMAGE, object)
            },
            ObjectKind::ClipBorder(style) => Self {
                fill: Some(style.stroke),
                is_clip_border: true,
                ..Self::base(TYPE_RECT, object)
            },
        };
        Some(record)
    }

    /// Whether this record is user artwork rather than a clip artifact.
    pub fn is_content(&self) -> bool {
        !self.is_mask_image
            && !self.is_clip_border
            && (self.object_type == TYPE_TEXT || self.object_type == TYPE_IMAGE)
    }

    fn validate_geometry(&self, index: usize) -> Result<(), DeserializationError> {
        let values = [
            self.left,
            self.top,
            self.width,
            self.height,
            self.scale_x,
            self.scale_y,
            self.angle,
            self.opacity,
        ];
        if values.iter().all(|v| v.is_finite()) && self.width >= 0.0 && self.height >= 0.0 {
            Ok(())
        } else {
            Err(DeserializationError::MalformedRecord {
                index,
                reason: "non-finite or negative geometry".to_string(),
            })
        }
    }

    fn apply_common(&self, object: &mut SceneObject) {
        object.transform.scale_x = self.scale_x;
        object.transform.scale_y = self.scale_y;
        object.transform.angle = self.angle;
        object.width = self.width;
        object.height = self.height;
        object.opacity = self.opacity.clamp(0.0, 1.0);
        object.visible = self.visible;
        object.absolute_positioned = self.absolute_positioned || object.absolute_positioned;
    }
}

impl SceneDocument {
    /// An empty scene for a canvas of the given size.
    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            version: SCENE_FORMAT_VERSION,
            width,
            height,
            objects: Vec::new(),
        }
    }

    /// Parses a document, rejecting versions newer than this build understands.
    pub fn from_json(json: &str) -> Result<Self, DeserializationError> {
        let doc: Self = serde_json::from_str(json)?;
        doc.check_version()?;
        Ok(doc)
    }

    /// Compact JSON form, as stored per variant.
    pub fn to_json(&self) -> String {
        self.fingerprint()
    }

    /// Canonical serialization used for change detection.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Reject documents with a format version this build cannot read.
    pub fn check_version(&self) -> Result<(), DeserializationError> {
        if self.version == 0 || self.version > SCENE_FORMAT_VERSION {
            return Err(DeserializationError::UnsupportedVersion {
                found: self.version,
                supported: SCENE_FORMAT_VERSION,
            });
        }
        Ok(())
    }

    /// Number of artwork records, excluding masks and clip borders.
    pub fn content_count(&self) -> usize {
        self.objects.iter().filter(|r| r.is_content()).count()
    }

    pub fn has_content(&self) -> bool {
        self.objects.iter().any(ObjectRecord::is_content)
    }
}

/// A decoded scene that has not been installed on a canvas yet.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub objects: Vec<SceneObject>,
    pub width: f64,
    pub height: f64,
}

impl LoadedScene {
    /// Replace the canvas contents with this scene.
    ///
    /// Like loading any document, this drops the canvas background; callers
    /// re-assert it afterwards. Positions are rescaled when the scene was
    /// captured on a canvas of a different size.
    pub fn apply_to(self, canvas: &mut Canvas) {
        let mut objects = self.objects;
        if self.width > 0.0 && self.height > 0.0 {
            let sx = canvas.width() / self.width;
            let sy = canvas.height() / self.height;
            if (sx - 1.0).abs() > 1e-9 || (sy - 1.0).abs() > 1e-9 {
                let uniform = sx.min(sy);
                for object in &mut objects {
                    object.transform.left *= sx;
                    object.transform.top *= sy;
                    object.transform.scale_x *= uniform;
                    object.transform.scale_y *= uniform;
                }
            }
        }
        canvas.install(objects);
    }
}

/// Converts between live canvases and [`SceneDocument`]s.
pub struct SceneCodec {
    assets: Rc<AssetCache>,
}

impl SceneCodec {
    pub fn new(assets: Rc<AssetCache>) -> Self {
        Self { assets }
    }

    /// Capture the canvas. Objects excluded from export are skipped.
    pub fn serialize(canvas: &Canvas) -> SceneDocument {
        SceneDocument {
            version: SCENE_FORMAT_VERSION,
            width: canvas.width(),
            height: canvas.height(),
            objects: canvas
                .objects()
                .iter()
                .filter_map(ObjectRecord::from_object)
                .collect(),
        }
    }

    /// Decode a document into detached objects, loading referenced images.
    ///
    /// Nothing is applied on failure: either every record decodes and every
    /// image loads, or an error is returned and the caller keeps its canvas.
    pub async fn deserialize(
        &self,
        doc: &SceneDocument,
    ) -> Result<LoadedScene, DeserializationError> {
        doc.check_version()?;

        let mut objects = Vec::with_capacity(doc.objects.len());
        for (index, record) in doc.objects.iter().enumerate() {
            record.validate_geometry(index)?;
            let mut object = match record.object_type.as_str() {
                TYPE_TEXT => {
                    let text = record.text.clone().ok_or_else(|| {
                        DeserializationError::MalformedRecord {
                            index,
                            reason: "text object without text".to_string(),
                        }
                    })?;
                    let mut body = TextObject::new(
                        text,
                        record.font_family.clone().unwrap_or_default(),
                        record.font_size.unwrap_or(24.0),
                    );
                    if let Some(fill) = record.fill {
                        body.fill = fill;
                    }
                    SceneObject::text(body, record.left, record.top)
                }
                TYPE_IMAGE => {
                    let src = record.src.clone().ok_or_else(|| {
                        DeserializationError::MalformedRecord {
                            index,
                            reason: "image object without src".to_string(),
                        }
                    })?;
                    let pixels = self.assets.image(&src).await.map_err(|e| {
                        DeserializationError::AssetUnavailable {
                            src: src.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    let data = ImageData::new(src, Some(pixels));
                    if record.is_mask_image {
                        SceneObject::mask(data, record.left, record.top)
                    } else {
                        SceneObject::image(data, record.left, record.top)
                    }
                }
                TYPE_RECT if record.is_clip_border => {
                    let style = ClipBorder {
                        stroke: record.fill.unwrap_or(ClipBorder::default().stroke),
                        ..ClipBorder::default()
                    };
                    let area = PrintArea {
                        left: record.left,
                        top: record.top,
                        width: record.width,
                        height: record.height,
                    };
                    SceneObject::clip_border(&area, style)
                }
                other => {
                    return Err(DeserializationError::UnknownObjectType {
                        index,
                        object_type: other.to_string(),
                    })
                }
            };
            record.apply_common(&mut object);
            objects.push(object);
        }

        Ok(LoadedScene {
            objects,
            width: doc.width,
            height: doc.height,
        })
    }

    /// Decode and install in one step. The canvas is untouched on failure.
    pub async fn load_into(
        &self,
        canvas: &mut Canvas,
        doc: &SceneDocument,
    ) -> Result<(), DeserializationError> {
        let scene = self.deserialize(doc).await?;
        scene.apply_to(canvas);
        Ok(())
    }
}
