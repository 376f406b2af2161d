//! HTTP surface consumed by the kiosk front end. Thin glue: every handler
//! delegates to the coordinator, the ledger, or the publisher.

pub mod routes;

use crate::application::coordinator::SessionCoordinator;
use crate::domain::ports::{LedgerHandle, PublisherHandle};
use axum::extract::Extension;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SessionCoordinator>,
    pub ledger: LedgerHandle,
    pub publisher: PublisherHandle,
    pub outbound_subject: String,
}

/// Builds the front-end router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index_handler))
        .route("/password", get(routes::password_handler))
        .route("/function", get(routes::function_handler))
        .route("/balance", get(routes::balance_handler))
        .route("/publish", post(routes::publish_handler))
        .route("/state", get(routes::state_handler))
        .route("/healthz", get(routes::healthz_handler))
        .layer(Extension(state))
}
