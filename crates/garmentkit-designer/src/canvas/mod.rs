//! Headless design canvas.
//!
//! Holds the ordered object list, the garment background, the active clip
//! region and a render-request counter. Index order is stack order: the last
//! object is drawn on top.

mod types;

pub use types::{
    Background, ClipBorder, Content, ImageData, ObjectKind, ObjectRole, ObjectTransform, Rgba,
    SceneObject, TextObject,
};

use crate::clip::ClipRegion;
use image::RgbaImage;
use std::rc::Rc;

/// Canvas state managing scene objects and the background.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: f64,
    height: f64,
    objects: Vec<SceneObject>,
    background: Background,
    active_clip: Option<ClipRegion>,
    next_id: u64,
    render_requests: u64,
}

impl Canvas {
    /// Creates an empty canvas of the given pixel size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
            background: Background::default(),
            active_clip: None,
            next_id: 1,
            render_requests: 0,
        }
    }

    /// Canvas width in canvas pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Canvas height in canvas pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// All objects in stacking order, bottom first.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    /// Number of objects, masks and borders included.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Gets a reference to an object by ID.
    pub fn get(&self, id: u64) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Gets a mutable reference to an object by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Adds an object on top of the stack and returns its new ID.
    pub fn add(&mut self, mut object: SceneObject) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        object.id = id;
        // New artwork joins the clip every other object is drawn through.
        if object.is_content() {
            object.clip = self.active_clip.as_ref().map(|c| c.id);
        }
        self.objects.push(object);
        id
    }

    /// Add a text object with its top-left corner at (`left`, `top`).
    pub fn add_text(&mut self, text: TextObject, left: f64, top: f64) -> u64 {
        self.add(SceneObject::text(text, left, top))
    }

    pub fn add_image(
        &mut self,
        src: impl Into<String>,
        pixels: Rc<RgbaImage>,
        left: f64,
        top: f64,
    ) -> u64 {
        self.add(SceneObject::image(
            ImageData::new(src, Some(pixels)),
            left,
            top,
        ))
    }

    /// Remove an object by id, returning it.
    pub fn remove(&mut self, id: u64) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(index))
    }

    /// Removes every object matching `predicate`, returning how many were removed.
    pub fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&SceneObject) -> bool,
    {
        let before = self.objects.len();
        self.objects.retain(|o| !predicate(o));
        before - self.objects.len()
    }

    /// Moves an object to the top of the stack.
    pub fn bring_to_front(&mut self, id: u64) -> bool {
        match self.objects.iter().position(|o| o.id == id) {
            Some(index) => {
                let object = self.objects.remove(index);
                self.objects.push(object);
                true
            }
            None => false,
        }
    }

    /// Move an object by (`dx`, `dy`). Returns `false` for an unknown id.
    pub fn translate(&mut self, id: u64, dx: f64, dy: f64) -> bool {
        match self.get_mut(id) {
            Some(object) => {
                object.transform.left += dx;
                object.transform.top += dy;
                true
            }
            None => false,
        }
    }

    /// Replace an object's position, scale and rotation.
    pub fn set_transform(&mut self, id: u64, transform: ObjectTransform) -> bool {
        match self.get_mut(id) {
            Some(object) => {
                object.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Removes all objects, the background and the active clip.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.background = Background::default();
        self.active_clip = None;
    }

    /// Replaces all objects and drops the background, like loading a fresh
    /// document. IDs are reassigned in stack order.
    pub fn install(&mut self, objects: Vec<SceneObject>) {
        self.objects.clear();
        self.background = Background::default();
        for object in objects {
            self.add(object);
        }
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Removes the background and returns what was there.
    pub fn take_background(&mut self) -> Background {
        std::mem::take(&mut self.background)
    }

    /// Clip new content is attached to, if one has been applied.
    pub fn active_clip(&self) -> Option<&ClipRegion> {
        self.active_clip.as_ref()
    }

    pub(crate) fn set_active_clip(&mut self, clip: Option<ClipRegion>) {
        self.active_clip = clip;
    }

    /// Artwork objects, excluding masks and clip borders.
    pub fn content(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.is_content())
    }

    /// Whether any user artwork (text or image) is present.
    pub fn has_content(&self) -> bool {
        self.content().next().is_some()
    }

    /// Mark the canvas dirty for the next frame.
    pub fn request_render(&mut self) {
        self.render_requests += 1;
    }

    /// Number of renders requested since the canvas was created.
    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }
}
