//! Print-area geometry.
//!
//! Converts a garment's real-world print size into a canvas rectangle. The
//! rectangle is center-anchored: `left`/`top` are the center point, which is
//! how every object on the canvas is positioned.

use garmentkit_core::units::inches_to_pixels;
use garmentkit_core::Side;
use garmentkit_settings::{Config, GarmentSpec};
use std::collections::BTreeMap;

/// A center-anchored rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintArea {
    /// Center x.
    pub left: f64,
    /// Center y.
    pub top: f64,
    /// Full width, after the side's margin is applied.
    pub width: f64,
    /// Full height, after the side's margin is applied.
    pub height: f64,
}

impl PrintArea {
    /// Returns `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        (self.left - hw, self.top - hh, self.left + hw, self.top + hh)
    }

    /// Whether the canvas point lies inside the area, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (x1, y1, x2, y2) = self.bounds();
        x >= x1 && x <= x2 && y >= y1 && y <= y2
    }
}

/// Pure print-area math over the garment catalog.
#[derive(Debug, Clone)]
pub struct PrintAreaCalculator {
    garments: BTreeMap<String, GarmentSpec>,
    dpi: f64,
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

impl PrintAreaCalculator {
    pub fn new(config: &Config) -> Self {
        Self {
            garments: config.garments.clone(),
            dpi: config.designer.dpi,
        }
    }

    /// Pixels per inch used for the conversion.
    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Whether `garment` is in the catalog.
    pub fn knows(&self, garment: &str) -> bool {
        self.garments.contains_key(garment)
    }

    /// Fit the garment's print area for `side` into a canvas.
    ///
    /// The rectangle never exceeds the canvas: the fit scale is capped at 1
    /// and then shrunk by the side's margin. Degenerate canvas sizes clamp to
    /// an empty rectangle. Returns `None` for a garment type that is not in
    /// the catalog.
    pub fn compute_fitted_rect(
        &self,
        canvas_width: f64,
        canvas_height: f64,
        garment: &str,
        side: Side,
    ) -> Option<PrintArea> {
        let spec = self.garments.get(garment)?;
        let canvas_width = sanitize(canvas_width);
        let canvas_height = sanitize(canvas_height);

        let size = spec.print_area.resolve(side);
        let max_w = inches_to_pixels(sanitize(size.width), self.dpi);
        let max_h = inches_to_pixels(sanitize(size.height), self.dpi);
        let margin = spec.margin.resolve(side).clamp(0.0, 1.0);

        let fit_scale = if max_w > 0.0 && max_h > 0.0 {
            (canvas_width / max_w).min(canvas_height / max_h).min(1.0)
        } else {
            0.0
        };
        let scale = fit_scale * margin;

        Some(PrintArea {
            left: canvas_width * spec.anchor.x.clamp(0.0, 1.0),
            top: canvas_height * spec.anchor.y.clamp(0.0, 1.0),
            width: max_w * scale,
            height: max_h * scale,
        })
    }
}
