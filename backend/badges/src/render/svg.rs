//! Minimal SVG markup builder, the vector drawing surface badges compose onto.

use std::fmt::Write;

use super::geometry::{clamp_radius, Rect};
use super::text::xml_escape;

pub const FONT_FAMILY: &str = "'Helvetica Neue', Arial, sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub size: f64,
    pub bold: bool,
    pub fill: &'a str,
    pub anchor: Anchor,
}

pub struct SvgCanvas {
    width: u32,
    height: u32,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    /// Filled rectangle; the corner radius is clamped to the shape.
    pub fn rounded_rect(&mut self, rect: &Rect, radius: f64, fill: &str) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let rx = clamp_radius(radius, rect.width, rect.height);
        let _ = writeln!(
            self.body,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}"/>"#,
            num(rect.x),
            num(rect.y),
            num(rect.width),
            num(rect.height),
            num(rx),
            xml_escape(fill),
        );
    }

    pub fn text(&mut self, x: f64, baseline: f64, content: &str, style: &TextStyle<'_>) {
        let weight = if style.bold { r#" font-weight="bold""# } else { "" };
        let anchor = match style.anchor {
            Anchor::Start => String::new(),
            other => format!(r#" text-anchor="{}""#, other.as_str()),
        };
        let _ = writeln!(
            self.body,
            r#"  <text x="{}" y="{}" font-family="{}" font-size="{}"{weight} fill="{}"{anchor}>{}</text>"#,
            num(x),
            num(baseline),
            FONT_FAMILY,
            num(style.size),
            xml_escape(style.fill),
            xml_escape(content),
        );
    }

    pub fn finish(self) -> String {
        format!(
            "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body,
        )
    }
}

/// Compact coordinate: integers print bare, everything else to two places.
fn num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
