use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, get_service},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde_json::json;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api::TaskApi;
use crate::config::AppConfig;
use crate::tasks;
use crate::views;

const NO_CACHE: &str = "no-cache, max-age=0, must-revalidate, no-store";
/// Time given to in-flight TLS connections once draining is over.
const TLS_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub api: TaskApi,
    pub shutdown: Arc<ShutdownState>,
}

impl AppState {
    pub fn new(api: TaskApi) -> Self {
        Self {
            api,
            shutdown: Arc::new(ShutdownState::default()),
        }
    }
}

/// Flipped once a termination signal arrives so readiness reports DOWN.
#[derive(Debug, Default)]
pub struct ShutdownState {
    shutting_down: AtomicBool,
}

impl ShutdownState {
    pub fn begin(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(tasks::homepage))
        .route("/health", get(liveness))
        .route("/health/readiness", get(readiness))
        .nest("/tasks", tasks::router())
        .fallback(not_found)
        .with_state(state)
        .nest_service("/static", get_service(ServeDir::new(static_dir)))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(TraceLayer::new_for_http())
}

// GET /health - Liveness
async fn liveness() -> Json<serde_json::Value> {
    Json(json!({ "status": "UP" }))
}

// GET /health/readiness - DOWN while draining
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.shutdown.is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "DOWN" })))
    } else {
        (StatusCode::OK, Json(json!({ "status": "UP" })))
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(views::render_error(StatusCode::NOT_FOUND.as_u16(), "Page not found")),
    )
}

/// Serve until a termination signal, over HTTPS when a local certificate
/// pair is configured and present.
pub async fn serve(config: &AppConfig, app: Router, shutdown: Arc<ShutdownState>) -> Result<()> {
    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen_addr()))?;
    let grace = config.shutdown_grace;

    match tls_config(config).await? {
        Some(tls) => {
            let handle = axum_server::Handle::new();
            let drain_handle = handle.clone();
            tokio::spawn(async move {
                drain_after_signal(shutdown, grace).await;
                drain_handle.graceful_shutdown(Some(TLS_CLOSE_TIMEOUT));
            });

            tracing::info!(
                environment = config.environment.as_str(),
                "application started: https://localhost:{}",
                config.port
            );
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            tracing::info!(
                environment = config.environment.as_str(),
                "application started: http://{addr}"
            );
            axum::serve(listener, app)
                .with_graceful_shutdown(drain_after_signal(shutdown, grace))
                .await?;
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

async fn tls_config(config: &AppConfig) -> Result<Option<RustlsConfig>> {
    let Some(paths) = &config.tls else {
        return Ok(None);
    };

    if !paths.cert.exists() || !paths.key.exists() {
        tracing::warn!(
            cert = %paths.cert.display(),
            key = %paths.key.display(),
            "certificate pair not found, serving plain HTTP"
        );
        return Ok(None);
    }

    // Several crates link rustls; pick the provider explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let tls = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .with_context(|| format!("failed to load certificate {}", paths.cert.display()))?;
    Ok(Some(tls))
}

/// Wait for SIGINT or SIGTERM, report DOWN, then give the load balancer
/// time to notice before connections are closed.
async fn drain_after_signal(shutdown: Arc<ShutdownState>, grace: Duration) {
    let signal = shutdown_signal().await;
    tracing::info!(signal, "caught signal, setting readiness to DOWN");
    shutdown.begin();

    tokio::time::sleep(grace).await;
    tracing::info!("shutting down application");
}

async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}
