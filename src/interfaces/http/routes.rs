use crate::domain::command::OutboundCommand;
use crate::domain::event::KioskEvent;
use crate::domain::session::Page;
use crate::error::{LedgerError, PublishError};
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Serialize)]
pub struct PageResponse {
    pub page: Page,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub rf_id: u64,
    pub balance: i64,
}

#[derive(Deserialize)]
pub struct PublishRequest {
    pub button: String,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Serialize)]
pub struct PublishResponse {
    pub ok: bool,
    pub published_to: String,
    pub button: String,
}

/// Errors surfaced to the front end as JSON with a matching status code.
pub enum ApiError {
    NoActiveSession,
    InvalidAmount,
    Ledger(LedgerError),
    Publish(PublishError),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

impl From<PublishError> for ApiError {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NoActiveSession => (StatusCode::CONFLICT, "no active session".to_string()),
            Self::InvalidAmount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "amount must be non-negative".to_string(),
            ),
            Self::Ledger(e @ LedgerError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            Self::Ledger(e @ LedgerError::AlreadyExists(_)) => (StatusCode::CONFLICT, e.to_string()),
            Self::Ledger(e @ LedgerError::WouldUnderflow { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            Self::Publish(e) => {
                tracing::error!(error = %e, "outbound publish failed");
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// `GET /` — end any running session, tell the hardware to wind down, and
/// hand the front end the idle page.
pub async fn index_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state.coordinator.transition(KioskEvent::SessionEnded).await?;
    state.publisher.emit(&OutboundCommand::EndSession).await?;
    Ok(Json(PageResponse { page }))
}

/// `GET /password` — the front end verified the user's secret; drop back
/// to the idle page.
pub async fn password_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .coordinator
        .transition(KioskEvent::CredentialVerified)
        .await?;
    Ok(Json(PageResponse { page }))
}

/// `GET /function` — reset and ask the hardware for a fresh interaction.
/// The `new_work` command comes out of the Idle + SessionStarted
/// transition itself.
pub async fn function_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<PageResponse>, ApiError> {
    state.coordinator.transition(KioskEvent::SessionEnded).await?;
    let page = state
        .coordinator
        .transition(KioskEvent::SessionStarted)
        .await?;
    Ok(Json(PageResponse { page }))
}

/// `GET /balance` — balance of the card currently in session. Without an
/// authenticated session this is a 409, not a default user.
pub async fn balance_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let snapshot = state.coordinator.snapshot().await;
    let rf_id = snapshot.active_user.ok_or(ApiError::NoActiveSession)?;
    let balance = state.ledger.lookup(rf_id).await?;
    Ok(Json(BalanceResponse { rf_id, balance }))
}

/// `POST /publish` — forward a front-end button to the hardware. A refill
/// button also moves the session to the awaiting-deposit page so the
/// following `refill_comp` confirms something we asked for.
pub async fn publish_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, ApiError> {
    if request.button == "refill" {
        // Same guard the dispatcher applies to bus-side deposit actions.
        if request.amount < 0 {
            return Err(ApiError::InvalidAmount);
        }
        state
            .coordinator
            .transition(KioskEvent::DepositRequested(request.amount))
            .await?;
    }
    state
        .publisher
        .emit(&OutboundCommand::Forward {
            action: request.button.clone(),
            data: request.amount,
        })
        .await?;
    Ok(Json(PublishResponse {
        ok: true,
        published_to: state.outbound_subject.clone(),
        button: request.button,
    }))
}

/// `GET /state` — the page the front end should be showing.
pub async fn state_handler(Extension(state): Extension<AppState>) -> Json<PageResponse> {
    let snapshot = state.coordinator.snapshot().await;
    Json(PageResponse {
        page: snapshot.page,
    })
}

/// `GET /healthz` — liveness probe.
pub async fn healthz_handler() -> &'static str {
    "ok"
}
