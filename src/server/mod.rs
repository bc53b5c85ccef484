//! HTTP surface: process list, results, PDF download and database backup.

mod error;
mod handlers;

use error::AppError;

use crate::config::Settings;
use crate::database::ElectionsDatabase;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct AppState {
    pub db: ElectionsDatabase,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: ElectionsDatabase, settings: Settings) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/procesos", get(handlers::list_processes))
        .route("/resultados/{process_id}", get(handlers::process_results))
        .route("/resultados/{process_id}/pdf", get(handlers::results_pdf))
        .route("/backup", get(handlers::download_backup))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn serve(state: AppState, bind: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Serving election results on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await
}

/// Reject requests without the configured bearer token
async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.settings.api_token.as_deref() {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if !provided.is_some_and(|token| token_matches(token, expected)) {
            log::warn!("Rejected unauthenticated request to {}", request.uri());
            return AppError::Unauthorized.into_response();
        }
    }

    next.run(request).await
}

/// Compare fixed-length digests in constant time so neither content nor length leaks
fn token_matches(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.ct_eq(&expected).into()
}
