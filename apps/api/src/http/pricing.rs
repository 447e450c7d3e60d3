//! Price preview endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rihla_core::{Money, PriceBreakdown};
use serde::Deserialize;

use super::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// `POST /api/pricing/preview` body.
///
/// ```json
/// { "basePriceCents": 20000, "couponCode": "SAVE10" }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePreviewRequest {
    pub base_price_cents: i64,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

pub(super) async fn preview_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PricePreviewRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PriceBreakdown>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let breakdown = state
        .pricing
        .compute_price(
            Money::from_cents(request.base_price_cents),
            request.coupon_code.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::ok(breakdown)))
}
