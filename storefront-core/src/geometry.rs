//! Fit and Placement - Pure Layout Math
//!
//! All factors stay in f64; integer conversion truncates toward zero and
//! happens only once a factor has been applied.

use serde::{Deserialize, Serialize};

/// Axis along which a scaled image still has slack and gets centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Width is binding, height has slack.
    Vertical,
    /// Height is binding (or tied), width has slack.
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fit {
    pub scale: f64,
    pub axis: Axis,
}

impl Fit {
    pub fn scaled(self, factor: f64) -> Self {
        Self { scale: self.scale * factor, ..self }
    }

    /// Scaled dimensions, each rounded independently.
    ///
    /// May drift from the source aspect ratio by a pixel.
    pub fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        let w = (width as f64 * self.scale) as u32;
        let h = (height as f64 * self.scale) as u32;
        (w.max(1), h.max(1))
    }
}

/// Uniform factor fitting `src` into `bounds`.
///
/// Returns `None` when any dimension is non-positive or not finite.
pub fn fit(src_width: f64, src_height: f64, box_width: f64, box_height: f64) -> Option<Fit> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if ![src_width, src_height, box_width, box_height].into_iter().all(positive) {
        return None;
    }

    let fx = box_width / src_width;
    let fy = box_height / src_height;
    // Strict comparison: a tie resolves to horizontal.
    let fit = if fx < fy {
        Fit { scale: fx, axis: Axis::Vertical }
    } else {
        Fit { scale: fy, axis: Axis::Horizontal }
    };
    Some(fit)
}

/// Rectangle in canvas pixel space. `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl PlacementRect {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// Center a scaled image inside a region along its slack axis.
///
/// On the binding axis the rectangle spans the whole region.
pub fn place(
    scaled_width: u32,
    scaled_height: u32,
    axis: Axis,
    origin: (i64, i64),
    region_width: f64,
    region_height: f64,
) -> PlacementRect {
    let (ox, oy) = origin;
    let (dx, dy) = (scaled_width as f64, scaled_height as f64);
    match axis {
        Axis::Vertical => PlacementRect::new(
            ox,
            oy + (region_height / 2.0 - dy / 2.0) as i64,
            ox + region_width as i64,
            oy + (region_height / 2.0 + dy / 2.0) as i64,
        ),
        Axis::Horizontal => PlacementRect::new(
            ox + (region_width / 2.0 - dx / 2.0) as i64,
            oy,
            ox + (region_width / 2.0 + dx / 2.0) as i64,
            oy + region_height as i64,
        ),
    }
}
