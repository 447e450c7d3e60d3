//! Ticket redemption endpoint.
//!
//! Providers scan at the venue; the scanner app shows `message` verbatim.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rihla_core::RedemptionError;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::AppState;

/// `POST /api/tickets/redeem` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub ticket_code: String,
    pub provider_id: String,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub success: bool,
    pub message: String,
    /// Title of the redeemed service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl RedeemResponse {
    fn failure(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(RedeemResponse {
                success: false,
                message: message.into(),
                service: None,
            }),
        )
    }
}

pub(super) async fn redeem_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RedeemRequest>, JsonRejection>,
) -> (StatusCode, Json<RedeemResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(e) => return RedeemResponse::failure(StatusCode::BAD_REQUEST, e.body_text()),
    };

    if request.ticket_code.trim().is_empty() {
        return RedeemResponse::failure(StatusCode::BAD_REQUEST, "Ticket code is required");
    }
    if request.provider_id.trim().is_empty() {
        return RedeemResponse::failure(StatusCode::BAD_REQUEST, "Provider id is required");
    }

    match state
        .redemption
        .redeem_ticket(&request.ticket_code, request.provider_id.trim())
        .await
    {
        Ok(redeemed) => (
            StatusCode::OK,
            Json(RedeemResponse {
                success: true,
                message: "Ticket redeemed".to_string(),
                service: Some(redeemed.service_title),
            }),
        ),
        Err(err) => {
            let status = match &err {
                RedemptionError::InvalidTicket => StatusCode::NOT_FOUND,
                RedemptionError::WrongProvider => StatusCode::FORBIDDEN,
                RedemptionError::AlreadyUsed => StatusCode::CONFLICT,
                RedemptionError::Store(reason) => {
                    error!(%reason, "Ticket store failed during redemption");
                    return RedeemResponse::failure(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Ticket service unavailable",
                    );
                }
            };
            RedeemResponse::failure(status, err.to_string())
        }
    }
}
