//! Payment processor callback endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::services::lifecycle::PaymentOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct WebhookQuery {
    hmac: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub outcome: PaymentOutcome,
}

/// `POST /api/webhooks/payment?hmac=<hex>`
///
/// The body is taken as raw bytes and verified before it is trusted.
pub(super) async fn payment_webhook_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let outcome = state
        .lifecycle
        .handle_webhook(&body, query.hmac.as_deref())
        .await?;

    Ok(Json(WebhookResponse {
        success: true,
        outcome,
    }))
}
