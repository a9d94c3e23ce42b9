//! Axum handlers: badge images plus a couple of diagnostic routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::cache::DataCache;
use crate::errors::BadgeError;
use crate::render::{self, BadgeRenderer, BadgeStyle, Format, Image};
use crate::upstream::{HttpSource, MetricsSource};

pub struct ApiState<S = HttpSource> {
    pub cache: Arc<DataCache<S>>,
    pub renderer: Arc<BadgeRenderer>,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `Cache-Control` policy attached to an image response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Public { max_age: u32 },
    NoStore,
}

impl CachePolicy {
    pub const STANDARD: Self = Self::Public { max_age: 300 };
    pub const FREQUENT: Self = Self::Public { max_age: 60 };

    pub fn header_value(self) -> String {
        match self {
            Self::Public { max_age } => format!("public, max-age={max_age}"),
            Self::NoStore => "no-store, no-cache, must-revalidate, max-age=0".to_string(),
        }
    }
}

/// Build an image response. The placeholder is never cacheable, whatever
/// the route's usual policy.
pub fn image_response(image: Image, policy: CachePolicy) -> Response {
    let policy = if image.is_placeholder() {
        CachePolicy::NoStore
    } else {
        policy
    };
    (
        [
            (header::CONTENT_TYPE, image.content_type().to_string()),
            (header::CACHE_CONTROL, policy.header_value()),
        ],
        image.bytes,
    )
        .into_response()
}

async fn serve_badge<S: MetricsSource>(
    state: &ApiState<S>,
    style: BadgeStyle,
    policy: CachePolicy,
) -> Response {
    let metrics = state.cache.get_metrics().await;
    let now = Utc::now();

    let rendered = match style.format {
        Format::Svg => state.renderer.render(&metrics, now, &style),
        Format::Png => {
            let renderer = Arc::clone(&state.renderer);
            tokio::task::spawn_blocking(move || renderer.render(&metrics, now, &style))
                .await
                .unwrap_or_else(|e| Err(BadgeError::Render(format!("render task failed: {e}"))))
        }
    };

    image_response(render::accept_or_placeholder(style.name, rendered), policy)
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /`
pub async fn index() -> &'static str {
    "Campaign badge server. Try /progress.svg, /badge.svg or /badge.png for images, or /test to see data."
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /test`
///
/// Fetches straight from the upstream (refreshing the cache on success) and
/// reports failures as `500` rather than hiding them behind a fallback.
pub async fn raw_metrics<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    match state.cache.refresh().await {
        Ok(metrics) => (StatusCode::OK, Json(metrics)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// `GET /progress.svg`
pub async fn progress_svg<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    serve_badge(&state, BadgeStyle::PROGRESS, CachePolicy::STANDARD).await
}

/// `GET /amount.svg`
pub async fn amount_svg<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    serve_badge(&state, BadgeStyle::AMOUNT, CachePolicy::STANDARD).await
}

/// `GET /donors.svg`
pub async fn donors_svg<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    serve_badge(&state, BadgeStyle::DONORS, CachePolicy::STANDARD).await
}

/// `GET /percentage.svg`
pub async fn percentage_svg<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    serve_badge(&state, BadgeStyle::PERCENTAGE, CachePolicy::STANDARD).await
}

/// `GET /countdown.svg`
pub async fn countdown_svg<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    serve_badge(&state, BadgeStyle::COUNTDOWN, CachePolicy::FREQUENT).await
}

/// `GET /badge.svg`
///
/// Carries the countdown, so it is never cached.
pub async fn badge_svg<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    serve_badge(&state, BadgeStyle::BADGE, CachePolicy::NoStore).await
}

/// `GET /badge.png`
pub async fn badge_png<S: MetricsSource>(State(state): State<Arc<ApiState<S>>>) -> Response {
    let style = BadgeStyle::BADGE.with_format(Format::Png);
    serve_badge(&state, style, CachePolicy::NoStore).await
}
