mod config;
mod demo;
mod host_page;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::{response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Clone)]
struct AppState {
    dist_dir: Arc<PathBuf>,
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_NO_STORE: &str = "no-store";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(dist_dir: &Path) -> Router {
    let state = AppState {
        dist_dir: Arc::new(dist_dir.to_path_buf()),
    };

    // Bundle assets carry content hashes; everything else is re-fetched so a
    // rebuilt bundle shows up on the next webview reload.
    let static_files = Router::new()
        .nest(
            "/assets",
            cached_static_router(&dist_dir.join("assets"), CACHE_IMMUTABLE),
        )
        .merge(cached_static_router(dist_dir, CACHE_NO_STORE));

    Router::new()
        .route("/", get(serve_index))
        .route("/host", get(host_page::host_page))
        .route("/api/demo-markers", get(demo::demo_markers_handler))
        .with_state(state)
        .merge(static_files)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    };
    if !config.dist_dir.join("index.html").exists() {
        tracing::warn!(
            dist_dir = %config.dist_dir.display(),
            "no index.html in dist dir, serving fallback page"
        );
    }

    let app = build_app(&config.dist_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("webview served at http://localhost:{}/", config.port);
    tracing::info!("host simulator at http://localhost:{}/host", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));
    axum::serve(listener, app).await.unwrap();
}

async fn serve_index(State(state): State<AppState>) -> Html<String> {
    // Serve the built webview, fall back to a pointer at the build step
    match tokio::fs::read_to_string(state.dist_dir.join("index.html")).await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Webview Map</title></head>
<body>
<h1>Webview Map</h1>
<p>Webview bundle not built yet. Run <code>dx bundle --platform web</code> in
<code>crates/frontend</code> and point <code>DIST_DIR</code> at its output.
The <a href="/host">host simulator</a> and <a href="/api/demo-markers">demo markers</a> work without it.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}
