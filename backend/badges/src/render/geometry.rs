//! Layout arithmetic for progress bars.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Painted width of a bar, floored at `min_visible` so the rounded cap stays
/// legible near zero, and never wider than the track.
pub fn bar_fill_width(track_width: f64, fill_fraction: f64, min_visible: f64) -> f64 {
    let track_width = track_width.max(0.0);
    let fraction = if fill_fraction.is_nan() {
        0.0
    } else {
        fill_fraction.clamp(0.0, 1.0)
    };
    (track_width * fraction).max(min_visible).min(track_width)
}

/// Corner radius that cannot self-intersect on a `width` × `height` shape.
pub fn clamp_radius(radius: f64, width: f64, height: f64) -> f64 {
    radius.min(width / 2.0).min(height / 2.0).max(0.0)
}

/// Where the percentage label goes relative to the bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelPlacement {
    /// Right-aligned at `x`, inside the filled part, light on the fill colour.
    Inside { x: f64 },
    /// Left-aligned at `x` above the track, in the accent colour.
    Above { x: f64 },
}

/// Put the label inside the fill when it fits with `margin` to spare
/// (split evenly either side), otherwise above the start of the track.
pub fn place_percent_label(track: &Rect, fill_width: f64, label_width: f64, margin: f64) -> LabelPlacement {
    if fill_width >= label_width + margin {
        LabelPlacement::Inside {
            x: track.x + fill_width - margin / 2.0,
        }
    } else {
        LabelPlacement::Above { x: track.x }
    }
}
