//! # HTTP Layer
//!
//! axum router wiring the service layer to JSON endpoints.

mod health;
mod pricing;
mod tickets;
mod webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::AppState;

pub use pricing::PricePreviewRequest;
pub use tickets::{RedeemRequest, RedeemResponse};
pub use webhook::WebhookResponse;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/pricing/preview", post(pricing::preview_handler))
        .route("/api/webhooks/payment", post(webhook::payment_webhook_handler))
        .route("/api/tickets/redeem", post(tickets::redeem_handler))
        .with_state(state)
}

/// Standard success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::services::test_support::{pending_booking, seeded_db, signed, transaction, PROVIDER, SECRET};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use rihla_db::{Database, DbConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(db: Database) -> Router {
        let config = ApiConfig::from_lookup(|key| match key {
            "PAYMENT_HMAC_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap();
        router(Arc::new(AppState::new(db, &config, Vec::new())))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (db, _) = seeded_db().await;
        let app = app(db);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_health_reports_closed_database() {
        let (db, _) = seeded_db().await;
        db.close().await;
        let app = app(db);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_price_preview() {
        let (db, _) = seeded_db().await;
        let app = app(db);

        let (status, body) = send(
            &app,
            post_json(
                "/api/pricing/preview",
                json!({ "basePriceCents": 20000, "couponCode": "save10" }).to_string(),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["originalPrice"], json!(20000));
        assert_eq!(body["data"]["discountAmount"], json!(2000));
        assert_eq!(body["data"]["finalPrice"], json!(18000));
        assert_eq!(body["data"]["platformFee"], json!(1800));
        assert_eq!(body["data"]["providerEarnings"], json!(16200));
        assert_eq!(body["data"]["couponCode"], json!("SAVE10"));
        assert_eq!(body["data"]["commissionRate"], json!(1000));
    }

    #[tokio::test]
    async fn test_price_preview_rejections() {
        let (db, _) = seeded_db().await;
        let app = app(db);

        let cases = [
            (json!({ "basePriceCents": 20000, "couponCode": "NOPE" }).to_string(), "INVALID_COUPON"),
            (json!({ "basePriceCents": 0 }).to_string(), "VALIDATION_ERROR"),
            (json!({ "couponCode": "SAVE10" }).to_string(), "VALIDATION_ERROR"),
            ("{not json".to_string(), "VALIDATION_ERROR"),
        ];

        for (request, code) in cases {
            let (status, body) = send(&app, post_json("/api/pricing/preview", request)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], json!(false));
            assert_eq!(body["code"], json!(code));
        }
    }

    #[tokio::test]
    async fn test_price_preview_without_commission() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let app = app(db);

        let (status, body) = send(
            &app,
            post_json("/api/pricing/preview", json!({ "basePriceCents": 20000 }).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], json!("CONFIGURATION_ERROR"));
    }

    #[tokio::test]
    async fn test_webhook_then_redeem() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let app = app(db);

        let (payload, signature) = signed(transaction(&booking.id, 18_000));
        let uri = format!("/api/webhooks/payment?hmac={}", signature);

        let (status, body) = send(&app, post_json(&uri, payload.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], json!("confirmed"));
        assert_eq!(body["outcome"]["bookingId"], json!(booking.id));
        let ticket = body["outcome"]["ticketCode"].as_str().unwrap().to_string();

        let (status, body) = send(&app, post_json(&uri, payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], json!("already_processed"));

        let redeem = json!({ "ticketCode": ticket, "providerId": PROVIDER }).to_string();
        let (status, body) = send(&app, post_json("/api/tickets/redeem", redeem.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["service"], json!("Nile Felucca Sunset Ride"));

        let (status, body) = send(&app, post_json("/api/tickets/redeem", redeem)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Ticket has already been used"));
    }

    #[tokio::test]
    async fn test_webhook_signature_required() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let app = app(db);
        let (payload, _) = signed(transaction(&booking.id, 18_000));

        for uri in [
            "/api/webhooks/payment",
            "/api/webhooks/payment?hmac=deadbeef",
        ] {
            let (status, body) = send(&app, post_json(uri, payload.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["code"], json!("UNAUTHORIZED"));
        }
    }

    #[tokio::test]
    async fn test_webhook_unknown_booking() {
        let (db, _) = seeded_db().await;
        let app = app(db);
        let (payload, signature) = signed(transaction("missing", 18_000));

        let uri = format!("/api/webhooks/payment?hmac={}", signature);
        let (status, _) = send(&app, post_json(&uri, payload)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redeem_rejections() {
        let (db, service) = seeded_db().await;
        let booking = pending_booking(&db, &service).await;
        let app = app(db);

        let (payload, signature) = signed(transaction(&booking.id, 18_000));
        let uri = format!("/api/webhooks/payment?hmac={}", signature);
        let (_, body) = send(&app, post_json(&uri, payload)).await;
        let ticket = body["outcome"]["ticketCode"].as_str().unwrap().to_string();

        let cases = [
            (json!({ "ticketCode": ticket, "providerId": "prov-sahara" }), StatusCode::FORBIDDEN),
            (json!({ "ticketCode": "TKT-NOPE", "providerId": PROVIDER }), StatusCode::NOT_FOUND),
            (json!({ "ticketCode": "  ", "providerId": PROVIDER }), StatusCode::BAD_REQUEST),
            (json!({ "ticketCode": ticket, "providerId": "" }), StatusCode::BAD_REQUEST),
            (json!({ "ticketCode": ticket }), StatusCode::BAD_REQUEST),
        ];

        for (request, expected) in cases {
            let (status, body) =
                send(&app, post_json("/api/tickets/redeem", request.to_string())).await;
            assert_eq!(status, expected, "{}", request);
            assert_eq!(body["success"], json!(false));
        }
    }
}
