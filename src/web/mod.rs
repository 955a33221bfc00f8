//! HTTP surface: page routes, JSON endpoints, and the layers around them.

use std::{any::Any, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tokio::{
    net::TcpListener,
    signal::ctrl_c,
};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    auth::AuthProvider,
    config::Config,
    db::{LeadStore, ProfileStore},
    error::{AppError, ERROR_PAGE},
    quote_image::QuoteRenderer,
    thumbnail::ThumbnailResolver,
};

mod api;
mod auth;
mod dashboard;
mod pages;
mod seo;
mod session;

pub use pages::Pages;

/// Everything a request handler can reach, built once at startup
pub struct State {
    pub config: Config,
    pub profiles: Arc<dyn ProfileStore>,
    pub leads: Arc<dyn LeadStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub thumbnails: Arc<dyn ThumbnailResolver>,
    pub pages: Pages,
    pub renderer: QuoteRenderer,
}

impl State {
    pub fn new(
        config: Config,
        profiles: Arc<dyn ProfileStore>,
        leads: Arc<dyn LeadStore>,
        auth: Arc<dyn AuthProvider>,
        thumbnails: Arc<dyn ThumbnailResolver>,
    ) -> Result<Arc<Self>> {
        let pages = Pages::new()?;

        Ok(Arc::new(Self {
            config,
            profiles,
            leads,
            auth,
            thumbnails,
            pages,
            renderer: QuoteRenderer::new(),
        }))
    }
}

/// Last-resort boundary: a panicking handler still gets the generic retry page
fn panic_page(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {detail}");

    (StatusCode::INTERNAL_SERVER_ERROR, Html(ERROR_PAGE)).into_response()
}

async fn not_found() -> AppError {
    AppError::NotFound
}

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(pages::home))
        .route("/creator-calc", get(pages::creator_calc))
        .route("/login", get(pages::login))
        .route("/dashboard", get(pages::dashboard))
        .route("/api/leads", post(api::submit_lead))
        .route("/api/leads/survey", post(api::submit_survey))
        .route("/api/quote", post(api::quote))
        .route("/api/quote/download", post(api::download_quote))
        .route(
            "/api/dashboard/profile",
            get(dashboard::load_profile).put(dashboard::save_profile),
        )
        .route("/auth/callback", get(auth::callback))
        .route("/auth/auth-code-error", get(pages::auth_code_error))
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/google", get(auth::google))
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/:username", get(pages::portfolio))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_page))
        .with_state(state)
}

pub async fn serve(state: Arc<State>) -> Result<()> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
