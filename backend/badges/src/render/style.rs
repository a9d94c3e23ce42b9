//! Badge layouts. Every endpoint is one of these presets fed through the
//! same renderer; a preset only says *where* things go and *which* things
//! are shown.

use super::geometry::Rect;
use super::svg::Anchor;

pub const ACCENT: &str = "#0f9dde";
pub const TRACK: &str = "#e0e0e0";
pub const STRONG_TEXT: &str = "#333";
pub const MUTED_TEXT: &str = "#555";
pub const FAINT_TEXT: &str = "#888";
pub const LIGHT_TEXT: &str = "#ffffff";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Svg,
    Png,
}

impl Format {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
        }
    }
}

/// "£50,000 of £100,000": the raised figure followed by the goal.
#[derive(Debug, Clone, Copy)]
pub struct AmountBlock {
    pub x: f64,
    pub baseline: f64,
    pub size: f64,
    pub goal_size: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PercentLabel {
    pub size: f64,
    /// Horizontal room the label needs beyond its own width, split evenly
    /// either side when it sits inside the fill.
    pub margin: f64,
    /// Baseline used when the label is pushed above the track.
    pub above_baseline: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct BarBlock {
    pub track: Rect,
    pub radius: f64,
    pub min_fill: f64,
    pub label: Option<PercentLabel>,
}

/// A large value with a small caption under it.
#[derive(Debug, Clone, Copy)]
pub struct StatBlock {
    pub x: f64,
    pub anchor: Anchor,
    pub value_baseline: f64,
    pub value_size: f64,
    pub caption: &'static str,
    pub caption_baseline: f64,
    pub caption_size: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CountdownBlock {
    pub x: f64,
    pub anchor: Anchor,
    pub heading: &'static str,
    pub heading_baseline: f64,
    pub heading_size: f64,
    pub value_baseline: f64,
    pub value_size: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct BadgeStyle {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub amount: Option<AmountBlock>,
    pub bar: Option<BarBlock>,
    pub donors: Option<StatBlock>,
    pub percent: Option<StatBlock>,
    pub countdown: Option<CountdownBlock>,
}

impl BadgeStyle {
    const EMPTY: Self = Self {
        name: "",
        width: 0,
        height: 0,
        format: Format::Svg,
        amount: None,
        bar: None,
        donors: None,
        percent: None,
        countdown: None,
    };

    pub const PROGRESS: Self = Self {
        name: "progress",
        width: 400,
        height: 30,
        bar: Some(BarBlock {
            track: Rect::new(0.0, 0.0, 400.0, 30.0),
            radius: 15.0,
            min_fill: 30.0,
            label: None,
        }),
        ..Self::EMPTY
    };

    pub const AMOUNT: Self = Self {
        name: "amount",
        width: 300,
        height: 40,
        amount: Some(AmountBlock {
            x: 0.0,
            baseline: 30.0,
            size: 32.0,
            goal_size: 16.0,
        }),
        ..Self::EMPTY
    };

    pub const DONORS: Self = Self {
        name: "donors",
        width: 100,
        height: 50,
        donors: Some(StatBlock {
            x: 50.0,
            anchor: Anchor::Middle,
            value_baseline: 25.0,
            value_size: 24.0,
            caption: "Supporters",
            caption_baseline: 45.0,
            caption_size: 12.0,
        }),
        ..Self::EMPTY
    };

    pub const PERCENTAGE: Self = Self {
        name: "percentage",
        width: 100,
        height: 50,
        percent: Some(StatBlock {
            x: 50.0,
            anchor: Anchor::Middle,
            value_baseline: 25.0,
            value_size: 24.0,
            caption: "Funded",
            caption_baseline: 45.0,
            caption_size: 12.0,
        }),
        ..Self::EMPTY
    };

    pub const COUNTDOWN: Self = Self {
        name: "countdown",
        width: 250,
        height: 60,
        countdown: Some(CountdownBlock {
            x: 5.0,
            anchor: Anchor::Start,
            heading: "Ends in:",
            heading_baseline: 20.0,
            heading_size: 14.0,
            value_baseline: 50.0,
            value_size: 28.0,
        }),
        ..Self::EMPTY
    };

    /// Everything at once: amount, bar with percent label, donors, countdown.
    pub const BADGE: Self = Self {
        name: "badge",
        width: 600,
        height: 200,
        amount: Some(AmountBlock {
            x: 20.0,
            baseline: 60.0,
            size: 40.0,
            goal_size: 18.0,
        }),
        bar: Some(BarBlock {
            track: Rect::new(20.0, 100.0, 560.0, 36.0),
            radius: 18.0,
            min_fill: 44.0,
            label: Some(PercentLabel {
                size: 16.0,
                margin: 24.0,
                above_baseline: 92.0,
            }),
        }),
        donors: Some(StatBlock {
            x: 20.0,
            anchor: Anchor::Start,
            value_baseline: 176.0,
            value_size: 22.0,
            caption: "supporters",
            caption_baseline: 194.0,
            caption_size: 12.0,
        }),
        percent: None,
        countdown: Some(CountdownBlock {
            x: 580.0,
            anchor: Anchor::End,
            heading: "Ends in",
            heading_baseline: 166.0,
            heading_size: 12.0,
            value_baseline: 190.0,
            value_size: 22.0,
        }),
        ..Self::EMPTY
    };

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}
