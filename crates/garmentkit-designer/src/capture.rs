//! Raster capture of the design layer and the garment mockup.
//!
//! Design-only captures strip the garment photo and the print-area border
//! for the duration of the render and always put them back, whether the
//! render succeeds or not.

use crate::canvas::{Background, Canvas, Rgba};
use crate::font_manager::FontRegistry;
use crate::renderer::{
    draw_contain, pixmap_from_rgba, render_canvas, render_pixmap, rgba_from_pixmap, stage_pixmap,
    stage_size, RenderOptions,
};
use garmentkit_core::CaptureError;
use garmentkit_settings::CaptureSettings;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::ops::Deref;
use tiny_skia::{Color, PixmapPaint, Transform};

/// Hides presentation artifacts while alive and restores them on drop.
struct PresentationGuard<'a> {
    canvas: &'a mut Canvas,
    background: Option<Background>,
    hidden: Vec<u64>,
}

impl<'a> PresentationGuard<'a> {
    fn hide(canvas: &'a mut Canvas) -> Self {
        let background = canvas.take_background();
        let mut hidden = Vec::new();
        for object in canvas.objects_mut() {
            if object.is_clip_border() && object.visible {
                object.visible = false;
                hidden.push(object.id);
            }
        }
        Self {
            canvas,
            background: Some(background),
            hidden,
        }
    }
}

impl Deref for PresentationGuard<'_> {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        self.canvas
    }
}

impl Drop for PresentationGuard<'_> {
    fn drop(&mut self) {
        if let Some(background) = self.background.take() {
            self.canvas.set_background(background);
        }
        for id in self.hidden.drain(..) {
            if let Some(object) = self.canvas.get_mut(id) {
                object.visible = true;
            }
        }
    }
}

/// Encode an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| CaptureError::Encode {
            reason: e.to_string(),
        })?;
    Ok(out.into_inner())
}

/// Produces design-only layers, mockups and display crops.
#[derive(Debug, Clone)]
pub struct CaptureService {
    settings: CaptureSettings,
}

impl CaptureService {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    /// Crop and export settings in effect.
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Transparent render of the artwork alone.
    pub fn capture_design_only(
        &self,
        canvas: &mut Canvas,
        fonts: &FontRegistry,
        scale: f32,
    ) -> Result<RgbaImage, CaptureError> {
        let stage = PresentationGuard::hide(canvas);
        render_canvas(&stage, fonts, &RenderOptions::design_layer(scale))
    }

    /// Garment photo at contain fit with the design layer composited on top.
    ///
    /// Falls back to a render of the whole stage only when the compositing
    /// path fails.
    pub fn capture_full_mockup(
        &self,
        canvas: &mut Canvas,
        fonts: &FontRegistry,
        scale: f32,
    ) -> Result<RgbaImage, CaptureError> {
        match self.compose_mockup(canvas, fonts, scale) {
            Ok(image) => Ok(image),
            Err(primary) => {
                tracing::warn!("Mockup compositing failed ({}), trying stage render", primary);
                self.stage_fallback(canvas, fonts, scale)
                    .map_err(|fallback| CaptureError::FallbackFailed {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    })
            }
        }
    }

    fn compose_mockup(
        &self,
        canvas: &mut Canvas,
        fonts: &FontRegistry,
        scale: f32,
    ) -> Result<RgbaImage, CaptureError> {
        let (width, height) = stage_size(canvas, scale);
        let mut stage = stage_pixmap(width, height)?;

        let background = canvas.background().clone();
        if background.is_empty() {
            let [r, g, b, a] = self.settings.neutral_fill;
            stage.fill(Color::from_rgba8(r, g, b, a));
        } else {
            if let Some([r, g, b, a]) = background.color {
                stage.fill(Color::from_rgba8(r, g, b, a));
            }
            if let Some(image) = &background.image {
                draw_contain(&mut stage, image);
            }
        }

        let design = self.capture_design_only(canvas, fonts, scale)?;
        if design.dimensions() != (width, height) {
            return Err(CaptureError::EmptyStage {
                width: design.width(),
                height: design.height(),
            });
        }
        let layer = pixmap_from_rgba(&design).ok_or(CaptureError::EmptyStage { width, height })?;
        stage.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(rgba_from_pixmap(&stage))
    }

    fn stage_fallback(
        &self,
        canvas: &mut Canvas,
        fonts: &FontRegistry,
        scale: f32,
    ) -> Result<RgbaImage, CaptureError> {
        let options = RenderOptions {
            scale,
            background: true,
            clip_borders: false,
        };
        render_pixmap(canvas, fonts, &options).map(|p| rgba_from_pixmap(&p))
    }

    /// Crop a capture to its foreground for thumbnails and texture prep.
    ///
    /// The background reference is the average of the four corners of a
    /// white-composited sample. Returns the input unchanged when nothing
    /// stands out from the background or the foreground already reaches
    /// every edge.
    pub fn auto_crop_for_display(&self, image: &RgbaImage) -> RgbaImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }
        let cfg = &self.settings;

        let longest = width.max(height) as f64;
        let sample_scale = (cfg.auto_crop_max_dimension as f64 / longest).min(1.0);
        let sw = ((width as f64 * sample_scale).round() as u32).max(1);
        let sh = ((height as f64 * sample_scale).round() as u32).max(1);
        let sample = if (sw, sh) == (width, height) {
            image.clone()
        } else {
            imageops::resize(image, sw, sh, FilterType::Triangle)
        };

        let composite = |x: u32, y: u32| -> [f64; 3] {
            let p = sample.get_pixel(x, y).0;
            let a = p[3] as f64 / 255.0;
            [
                p[0] as f64 * a + 255.0 * (1.0 - a),
                p[1] as f64 * a + 255.0 * (1.0 - a),
                p[2] as f64 * a + 255.0 * (1.0 - a),
            ]
        };

        let corners = [(0, 0), (sw - 1, 0), (0, sh - 1), (sw - 1, sh - 1)];
        let mut reference = [0.0f64; 3];
        let mut corner_alpha = 0.0;
        for &(x, y) in &corners {
            let c = composite(x, y);
            for i in 0..3 {
                reference[i] += c[i] / 4.0;
            }
            corner_alpha += sample.get_pixel(x, y).0[3] as f64 / 4.0;
        }
        let transparent_background = corner_alpha < cfg.auto_crop_alpha_floor as f64;

        let step = cfg.auto_crop_step.max(1);
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        for y in (0..sh).step_by(step as usize) {
            for x in (0..sw).step_by(step as usize) {
                if sample.get_pixel(x, y).0[3] < cfg.auto_crop_alpha_floor {
                    continue;
                }
                let c = composite(x, y);
                let distance = ((c[0] - reference[0]).powi(2)
                    + (c[1] - reference[1]).powi(2)
                    + (c[2] - reference[2]).powi(2))
                .sqrt();
                if distance > cfg.auto_crop_threshold {
                    bbox = Some(match bbox {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }

        let Some((min_x, min_y, max_x, max_y)) = bbox else {
            return image.clone();
        };
        if min_x < step && min_y < step && max_x + step >= sw && max_y + step >= sh {
            return image.clone();
        }

        // Back to source resolution; the far edge covers the skipped stride.
        let to_src_x = width as f64 / sw as f64;
        let to_src_y = height as f64 / sh as f64;
        let x0 = (min_x as f64 * to_src_x).floor() as u32;
        let y0 = (min_y as f64 * to_src_y).floor() as u32;
        let x1 = (((max_x + step).min(sw)) as f64 * to_src_x).ceil().min(width as f64) as u32;
        let y1 = (((max_y + step).min(sh)) as f64 * to_src_y).ceil().min(height as f64) as u32;

        let pad_x = ((x1 - x0) as f64 * cfg.auto_crop_pad_x).round() as u32;
        let pad_y = ((y1 - y0) as f64 * cfg.auto_crop_pad_y).round() as u32;
        let x0 = x0.saturating_sub(pad_x);
        let y0 = y0.saturating_sub(pad_y);
        let x1 = (x1 + pad_x).min(width);
        let y1 = (y1 + pad_y).min(height);
        let crop_w = (x1 - x0).max(1);
        let crop_h = (y1 - y0).max(1);

        let cropped = imageops::crop_imm(image, x0, y0, crop_w, crop_h).to_image();

        if (crop_w as f64 / crop_h as f64) <= cfg.auto_crop_max_aspect {
            return cropped;
        }

        let padded_h = (crop_w as f64 / cfg.auto_crop_max_aspect).ceil() as u32;
        let fill: Rgba = if transparent_background {
            [0, 0, 0, 0]
        } else {
            [
                reference[0].round() as u8,
                reference[1].round() as u8,
                reference[2].round() as u8,
                255,
            ]
        };
        let mut padded = RgbaImage::from_pixel(crop_w, padded_h, image::Rgba(fill));
        let offset = ((padded_h - crop_h) / 2) as i64;
        imageops::replace(&mut padded, &cropped, 0, offset);
        padded
    }
}
