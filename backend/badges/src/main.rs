//! Campaign badge server — entry point.
//!
//! Serves small fixed-size images (progress bar, amount raised, donor
//! count, countdown) that mirror a fundraising campaign's live state, for
//! embedding where scripts cannot run.  Metrics come from an upstream JSON
//! endpoint through a TTL cache that falls back to the last good snapshot.

mod api;
mod cache;
mod config;
mod errors;
mod metrics;
mod refresher;
mod render;
mod upstream;

use std::sync::Arc;

use axum::{routing::get, Router};
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::DataCache;
use config::Config;
use render::BadgeRenderer;
use upstream::HttpSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    info!(
        "Config: ttl={}s timeout={}s campaign_end={}",
        config.cache_ttl.as_secs(),
        config.fetch_timeout.as_secs(),
        config.campaign_end
    );

    // A bounded timeout turns a hung upstream into an ordinary fetch failure.
    let client = Client::builder().timeout(config.fetch_timeout).build()?;

    let source = HttpSource::new(client, config.metrics_url.clone());
    let cache = Arc::new(DataCache::new(source, config.cache_ttl));
    info!("Upstream metrics source: {}", cache.source().url());

    // ─── Background refresh ───────────────────────────────
    tokio::spawn(refresher::warm_up(Arc::clone(&cache)));
    if let Some(interval) = config.refresh_interval {
        tokio::spawn(refresher::run(Arc::clone(&cache), interval));
    }

    // ─── HTTP API ─────────────────────────────────────────
    let api_state = Arc::new(api::ApiState {
        cache,
        renderer: Arc::new(BadgeRenderer::new(
            config.campaign_end,
            config.currency_symbol.clone(),
        )),
    });

    let app = Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health))
        .route("/test", get(api::raw_metrics::<HttpSource>))
        .route("/progress.svg", get(api::progress_svg::<HttpSource>))
        .route("/amount.svg", get(api::amount_svg::<HttpSource>))
        .route("/donors.svg", get(api::donors_svg::<HttpSource>))
        .route("/percentage.svg", get(api::percentage_svg::<HttpSource>))
        .route("/countdown.svg", get(api::countdown_svg::<HttpSource>))
        .route("/badge.svg", get(api::badge_svg::<HttpSource>))
        .route("/badge.png", get(api::badge_png::<HttpSource>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(api_state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
