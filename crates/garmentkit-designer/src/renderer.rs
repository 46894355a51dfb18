//! Canvas renderer.
//! Rasterizes a canvas to RGBA using tiny-skia for anti-aliased 2D rendering.
//!
//! Features:
//! - Garment background at contain fit over an optional flat color
//! - Artwork drawn through the active clip (print-area rectangle or mask silhouette)
//! - Text via rusttype glyph coverage
//! - Dashed print-area border on top

use crate::canvas::{
    Canvas, ClipBorder, Content, ObjectKind, ObjectTransform, Rgba, SceneObject, TextObject,
};
use crate::clip::{ClipRegion, ClipShape};
use crate::font_manager::FontRegistry;
use garmentkit_core::CaptureError;
use image::RgbaImage;
use rusttype::{point as rt_point, Scale};
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, IntSize, Mask, MaskType, Paint, PathBuilder, Pattern,
    Pixmap, Rect, SpreadMode, Stroke, StrokeDash, Transform,
};

/// Largest output edge in pixels.
pub const MAX_STAGE_EDGE: u32 = garmentkit_settings::MAX_EXPORT_EDGE;

/// What to draw and at which resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Output pixels per canvas pixel.
    pub scale: f32,
    /// Draw the background image and color.
    pub background: bool,
    /// Draw clip-border outlines.
    pub clip_borders: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: true,
            clip_borders: true,
        }
    }
}

impl RenderOptions {
    /// Transparent artwork layer: no background, no borders.
    pub fn design_layer(scale: f32) -> Self {
        Self {
            scale,
            background: false,
            clip_borders: false,
        }
    }
}

fn color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Allocate an output surface, rejecting empty or oversized stages.
pub fn stage_pixmap(width: u32, height: u32) -> Result<Pixmap, CaptureError> {
    if width == 0 || height == 0 || width > MAX_STAGE_EDGE || height > MAX_STAGE_EDGE {
        return Err(CaptureError::EmptyStage { width, height });
    }
    Pixmap::new(width, height).ok_or(CaptureError::EmptyStage { width, height })
}

/// Output size for a canvas at `scale`.
pub fn stage_size(canvas: &Canvas, scale: f32) -> (u32, u32) {
    let scale = if scale.is_finite() && scale > 0.0 {
        scale as f64
    } else {
        0.0
    };
    (
        (canvas.width() * scale).round().max(0.0) as u32,
        (canvas.height() * scale).round().max(0.0) as u32,
    )
}

/// Convert straight RGBA to a premultiplied pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, size)
}

/// Convert a premultiplied pixmap back to straight RGBA.
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

/// Placement `(x, y, width, height)` of an image fitted inside a box while
/// keeping its aspect ratio, centered.
pub fn contain_rect(image_w: f64, image_h: f64, box_w: f64, box_h: f64) -> (f64, f64, f64, f64) {
    if image_w <= 0.0 || image_h <= 0.0 || box_w <= 0.0 || box_h <= 0.0 {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let scale = (box_w / image_w).min(box_h / image_h);
    let w = image_w * scale;
    let h = image_h * scale;
    ((box_w - w) / 2.0, (box_h - h) / 2.0, w, h)
}

/// Draw `image` at contain fit over the whole of `target`.
pub fn draw_contain(target: &mut Pixmap, image: &RgbaImage) {
    let Some(source) = pixmap_from_rgba(image) else {
        return;
    };
    let (x, y, w, h) = contain_rect(
        image.width() as f64,
        image.height() as f64,
        target.width() as f64,
        target.height() as f64,
    );
    let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
        return;
    };
    let pattern = Pattern::new(
        source.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bilinear,
        1.0,
        Transform::from_translate(x as f32, y as f32)
            .pre_scale(w as f32 / source.width() as f32, h as f32 / source.height() as f32),
    );
    let paint = Paint {
        shader: pattern,
        anti_alias: true,
        ..Default::default()
    };
    target.fill_rect(rect, &paint, Transform::identity(), None);
}

/// Canvas-to-output transform for an object's local box (centered at origin).
fn object_transform(t: &ObjectTransform, scale: f32) -> Transform {
    Transform::from_scale(scale, scale)
        .pre_translate(t.left as f32, t.top as f32)
        .pre_concat(Transform::from_rotate(t.angle as f32))
        .pre_scale(t.scale_x as f32, t.scale_y as f32)
}

/// Draw a raster stretched over an object's `box_w` x `box_h` local box.
fn draw_raster(
    target: &mut Pixmap,
    raster: &Pixmap,
    box_w: f32,
    box_h: f32,
    transform: Transform,
    opacity: f32,
    mask: Option<&Mask>,
) {
    let Some(rect) = Rect::from_xywh(-box_w / 2.0, -box_h / 2.0, box_w, box_h) else {
        return;
    };
    let pattern = Pattern::new(
        raster.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bilinear,
        opacity.clamp(0.0, 1.0),
        Transform::from_translate(-box_w / 2.0, -box_h / 2.0).pre_scale(
            box_w / raster.width() as f32,
            box_h / raster.height() as f32,
        ),
    );
    let paint = Paint {
        shader: pattern,
        anti_alias: true,
        ..Default::default()
    };
    target.fill_rect(rect, &paint, transform, mask);
}

/// Rasterize a text object's glyphs into its own box at `scale`.
fn rasterize_text(
    text: &TextObject,
    box_w: f64,
    box_h: f64,
    scale: f32,
    fonts: &FontRegistry,
) -> Option<Pixmap> {
    let width = (box_w * scale as f64).ceil().max(1.0) as u32;
    let height = (box_h * scale as f64).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height)?;

    let Some(font) = fonts.resolve(&text.font_family) else {
        return Some(pixmap);
    };

    let size = text.font_size as f32 * scale;
    let glyph_scale = Scale::uniform(size);
    let ascent = font.v_metrics(glyph_scale).ascent;
    let line_height = size * 1.2;
    let [r, g, b, a] = text.fill;

    let pixels = pixmap.pixels_mut();
    for (line_index, line) in text.text.lines().enumerate() {
        let baseline = rt_point(0.0, ascent + line_height * line_index as f32);
        for glyph in font.layout(line, glyph_scale, baseline) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let x = gx as i32 + bb.min.x;
                let y = gy as i32 + bb.min.y;
                if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * a as f32).round() as u8;
                let idx = (y as u32 * width + x as u32) as usize;
                let existing = pixels[idx].alpha();
                if alpha > existing {
                    pixels[idx] = ColorU8::from_rgba(r, g, b, alpha).premultiply();
                }
            });
        }
    }
    Some(pixmap)
}

fn draw_image_object(
    target: &mut Pixmap,
    object: &SceneObject,
    pixels: Option<&RgbaImage>,
    scale: f32,
    mask: Option<&Mask>,
) {
    let Some(raster) = pixels.and_then(pixmap_from_rgba) else {
        return;
    };
    draw_raster(
        target,
        &raster,
        object.width as f32,
        object.height as f32,
        object_transform(&object.transform, scale),
        object.opacity as f32,
        mask,
    );
}

fn draw_border(target: &mut Pixmap, object: &SceneObject, style: &ClipBorder, scale: f32) {
    let Some(rect) = Rect::from_xywh(
        (object.transform.left - object.width / 2.0) as f32,
        (object.transform.top - object.height / 2.0) as f32,
        object.width as f32,
        object.height as f32,
    ) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let mut paint = Paint::default();
    paint.set_color(color(style.stroke));
    paint.anti_alias = true;
    let stroke = Stroke {
        width: style.stroke_width,
        dash: StrokeDash::new(style.dash.to_vec(), 0.0),
        ..Default::default()
    };
    target.stroke_path(&path, &paint, &stroke, Transform::from_scale(scale, scale), None);
}

/// Build the alpha mask for a clip at output resolution.
pub fn clip_mask(clip: &ClipRegion, width: u32, height: u32, scale: f32) -> Option<Mask> {
    match &clip.shape {
        ClipShape::Rect(area) => {
            let mut mask = Mask::new(width, height)?;
            let (x1, y1, _, _) = area.bounds();
            if let Some(rect) =
                Rect::from_xywh(x1 as f32, y1 as f32, area.width as f32, area.height as f32)
            {
                let path = PathBuilder::from_rect(rect);
                mask.fill_path(&path, FillRule::Winding, true, Transform::from_scale(scale, scale));
            }
            Some(mask)
        }
        ClipShape::Mask(object) => {
            silhouette_mask(std::slice::from_ref(object.as_ref()), width, height, scale)
        }
        ClipShape::Group(objects) => silhouette_mask(objects, width, height, scale),
    }
}

fn silhouette_mask(objects: &[SceneObject], width: u32, height: u32, scale: f32) -> Option<Mask> {
    let mut layer = Pixmap::new(width, height)?;
    for object in objects {
        let transform = object_transform(&object.transform, scale);
        let pixels = match &object.kind {
            ObjectKind::Mask(data) => data.pixels.as_deref(),
            _ => None,
        };
        match pixels.and_then(pixmap_from_rgba) {
            Some(raster) => draw_raster(
                &mut layer,
                &raster,
                object.width as f32,
                object.height as f32,
                transform,
                1.0,
                None,
            ),
            None => {
                // Unloaded silhouettes clip to their bounding box.
                let w = object.width as f32;
                let h = object.height as f32;
                if let Some(rect) = Rect::from_xywh(-w / 2.0, -h / 2.0, w, h) {
                    let mut paint = Paint::default();
                    paint.set_color_rgba8(0, 0, 0, 255);
                    layer.fill_rect(rect, &paint, transform, None);
                }
            }
        }
    }
    Some(Mask::from_pixmap(layer.as_ref(), MaskType::Alpha))
}

/// Render a canvas into a new pixmap.
pub fn render_pixmap(
    canvas: &Canvas,
    fonts: &FontRegistry,
    options: &RenderOptions,
) -> Result<Pixmap, CaptureError> {
    let (width, height) = stage_size(canvas, options.scale);
    let mut pixmap = stage_pixmap(width, height)?;
    let scale = options.scale;

    if options.background {
        let background = canvas.background();
        if let Some(fill) = background.color {
            pixmap.fill(color(fill));
        }
        if let Some(image) = &background.image {
            draw_contain(&mut pixmap, image);
        }
    }

    let active = canvas.active_clip();
    let mask = active.and_then(|clip| clip_mask(clip, width, height, scale));

    for object in canvas.objects().iter().filter(|o| o.visible) {
        let clip_mask = match (active, object.clip) {
            (Some(clip), Some(id)) if clip.id == id => mask.as_ref(),
            _ => None,
        };
        match &object.kind {
            ObjectKind::Content(Content::Text(text)) => {
                let raster = rasterize_text(text, object.width, object.height, scale, fonts);
                if let Some(raster) = raster {
                    draw_raster(
                        &mut pixmap,
                        &raster,
                        object.width as f32,
                        object.height as f32,
                        object_transform(&object.transform, scale),
                        object.opacity as f32,
                        clip_mask,
                    );
                }
            }
            ObjectKind::Content(Content::Image(data)) => {
                draw_image_object(&mut pixmap, object, data.pixels.as_deref(), scale, clip_mask);
            }
            ObjectKind::Mask(data) => {
                draw_image_object(&mut pixmap, object, data.pixels.as_deref(), scale, None);
            }
            ObjectKind::ClipBorder(style) => {
                if options.clip_borders {
                    draw_border(&mut pixmap, object, style, scale);
                }
            }
        }
    }

    Ok(pixmap)
}

/// Render a canvas to straight RGBA.
pub fn render_canvas(
    canvas: &Canvas,
    fonts: &FontRegistry,
    options: &RenderOptions,
) -> Result<RgbaImage, CaptureError> {
    render_pixmap(canvas, fonts, options).map(|p| rgba_from_pixmap(&p))
}
