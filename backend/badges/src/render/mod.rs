//! Badge composition: metrics + wall-clock time + a [`BadgeStyle`] → image.
//!
//! Rendering is synchronous and CPU-bound.  Vector output cannot fail; the
//! raster path can, and [`BadgeRenderer::render_or_placeholder`] turns any
//! such failure into a transparent 1×1 PNG so embedded images never break.

pub mod countdown;
pub mod geometry;
pub mod raster;
pub mod style;
pub mod svg;
pub mod text;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::errors::{BadgeError, Result};
use crate::metrics::CampaignMetrics;

use countdown::Countdown;
use geometry::{bar_fill_width, place_percent_label, LabelPlacement, Rect};
use style::{
    AmountBlock, BarBlock, CountdownBlock, StatBlock, ACCENT, FAINT_TEXT, LIGHT_TEXT, MUTED_TEXT,
    STRONG_TEXT, TRACK,
};
use svg::{Anchor, SvgCanvas, TextStyle};
use text::{format_money, HelveticaMetrics, TextMeasure};

pub use style::{BadgeStyle, Format};

/// Gap between the raised amount and the goal that follows it.
const AMOUNT_GAP: f64 = 8.0;

/// Rendered image bytes together with their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub format: Format,
    pub bytes: Vec<u8>,
}

impl Image {
    pub fn placeholder() -> Self {
        Self {
            format: Format::Png,
            bytes: raster::PLACEHOLDER_PNG.to_vec(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.bytes == raster::PLACEHOLDER_PNG
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

pub struct BadgeRenderer<M = HelveticaMetrics> {
    measure: M,
    campaign_end: DateTime<Utc>,
    currency_symbol: String,
}

impl BadgeRenderer<HelveticaMetrics> {
    pub fn new(campaign_end: DateTime<Utc>, currency_symbol: impl Into<String>) -> Self {
        Self::with_measure(HelveticaMetrics, campaign_end, currency_symbol)
    }
}

impl<M: TextMeasure> BadgeRenderer<M> {
    pub fn with_measure(
        measure: M,
        campaign_end: DateTime<Utc>,
        currency_symbol: impl Into<String>,
    ) -> Self {
        Self {
            measure,
            campaign_end,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Compose the badge as SVG markup. Total for every well-formed input.
    pub fn render_svg(&self, metrics: &CampaignMetrics, now: DateTime<Utc>, style: &BadgeStyle) -> String {
        let mut canvas = SvgCanvas::new(style.width, style.height);

        if let Some(block) = &style.amount {
            self.draw_amount(&mut canvas, metrics, block);
        }
        if let Some(block) = &style.bar {
            self.draw_bar(&mut canvas, metrics, block);
        }
        if let Some(block) = &style.donors {
            draw_stat(&mut canvas, &metrics.donation_count.to_string(), block);
        }
        if let Some(block) = &style.percent {
            draw_stat(&mut canvas, &format!("{}%", metrics.percent()), block);
        }
        if let Some(block) = &style.countdown {
            draw_countdown(&mut canvas, Countdown::between(self.campaign_end, now), block);
        }

        canvas.finish()
    }

    /// Render in the style's output format.
    pub fn render(&self, metrics: &CampaignMetrics, now: DateTime<Utc>, style: &BadgeStyle) -> Result<Image> {
        let markup = self.render_svg(metrics, now, style);
        let bytes = match style.format {
            Format::Svg => markup.into_bytes(),
            Format::Png => raster::rasterize(&markup, style.width, style.height)?,
        };
        Ok(Image {
            format: style.format,
            bytes,
        })
    }

    /// Render, substituting the placeholder for anything unusable.
    pub fn render_or_placeholder(
        &self,
        metrics: &CampaignMetrics,
        now: DateTime<Utc>,
        style: &BadgeStyle,
    ) -> Image {
        accept_or_placeholder(style.name, self.render(metrics, now, style))
    }

    fn draw_amount(&self, canvas: &mut SvgCanvas, metrics: &CampaignMetrics, block: &AmountBlock) {
        let raised = format_money(metrics.amount_raised, &self.currency_symbol);
        let goal = format!("of {}", format_money(metrics.target, &self.currency_symbol));

        canvas.text(
            block.x,
            block.baseline,
            &raised,
            &TextStyle {
                size: block.size,
                bold: true,
                fill: ACCENT,
                anchor: Anchor::Start,
            },
        );
        let goal_x = block.x + self.measure.width(&raised, block.size, true) + AMOUNT_GAP;
        canvas.text(
            goal_x,
            block.baseline,
            &goal,
            &TextStyle {
                size: block.goal_size,
                bold: false,
                fill: FAINT_TEXT,
                anchor: Anchor::Start,
            },
        );
    }

    fn draw_bar(&self, canvas: &mut SvgCanvas, metrics: &CampaignMetrics, block: &BarBlock) {
        let track = block.track;
        let fill_width = bar_fill_width(track.width, metrics.fill_fraction(), block.min_fill);

        canvas.rounded_rect(&track, block.radius, TRACK);
        canvas.rounded_rect(
            &Rect::new(track.x, track.y, fill_width, track.height),
            block.radius,
            ACCENT,
        );

        let Some(label) = &block.label else {
            return;
        };
        let text = format!("{}%", metrics.percent());
        let label_width = self.measure.width(&text, label.size, true);

        match place_percent_label(&track, fill_width, label_width, label.margin) {
            LabelPlacement::Inside { x } => {
                // Roughly centre the cap height on the bar's midline.
                let baseline = track.y + track.height / 2.0 + label.size * 0.35;
                canvas.text(
                    x,
                    baseline,
                    &text,
                    &TextStyle {
                        size: label.size,
                        bold: true,
                        fill: LIGHT_TEXT,
                        anchor: Anchor::End,
                    },
                );
            }
            LabelPlacement::Above { x } => {
                canvas.text(
                    x,
                    label.above_baseline,
                    &text,
                    &TextStyle {
                        size: label.size,
                        bold: true,
                        fill: ACCENT,
                        anchor: Anchor::Start,
                    },
                );
            }
        }
    }
}

fn draw_stat(canvas: &mut SvgCanvas, value: &str, block: &StatBlock) {
    canvas.text(
        block.x,
        block.value_baseline,
        value,
        &TextStyle {
            size: block.value_size,
            bold: true,
            fill: STRONG_TEXT,
            anchor: block.anchor,
        },
    );
    canvas.text(
        block.x,
        block.caption_baseline,
        block.caption,
        &TextStyle {
            size: block.caption_size,
            bold: false,
            fill: MUTED_TEXT,
            anchor: block.anchor,
        },
    );
}

fn draw_countdown(canvas: &mut SvgCanvas, countdown: Countdown, block: &CountdownBlock) {
    let value_style = TextStyle {
        size: block.value_size,
        bold: true,
        fill: ACCENT,
        anchor: block.anchor,
    };
    if countdown.is_ended() {
        canvas.text(block.x, block.value_baseline, "Campaign Ended", &value_style);
        return;
    }
    canvas.text(
        block.x,
        block.heading_baseline,
        block.heading,
        &TextStyle {
            size: block.heading_size,
            bold: true,
            fill: ACCENT,
            anchor: block.anchor,
        },
    );
    canvas.text(block.x, block.value_baseline, &countdown.to_string(), &value_style);
}

/// Keep a render only if it is usable; otherwise log and fall back to the placeholder.
pub fn accept_or_placeholder(name: &str, rendered: Result<Image>) -> Image {
    match rendered {
        Ok(image) if image.format == Format::Svg && !image.bytes.is_empty() => image,
        Ok(image) if image.format == Format::Png && raster::is_plausible_png(&image.bytes) => image,
        Ok(image) => {
            warn!(
                "Badge '{name}' produced an unusable {} byte {:?} image; serving placeholder",
                image.bytes.len(),
                image.format
            );
            Image::placeholder()
        }
        Err(e) => {
            log_render_failure(name, &e);
            Image::placeholder()
        }
    }
}

fn log_render_failure(name: &str, e: &BadgeError) {
    warn!("Badge '{name}' failed to render; serving placeholder: {e}");
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
