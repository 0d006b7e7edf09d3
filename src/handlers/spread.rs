use actix_web::http::header::CACHE_CONTROL;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse, Responder};
use log::warn;
use serde_json::{json, Value};

use crate::models::AppState;
use crate::services::upstream::UpstreamError;

#[get("/api/spread")]
pub async fn relay_default(data: web::Data<AppState>) -> impl Responder {
    let outcome = data.upstream.fetch_raw(&data.draw.product_id).await;
    relay_outcome(outcome)
}

#[get("/api/{product_id}/spread")]
pub async fn relay_product(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let product_id = path.into_inner();
    let outcome = data.upstream.fetch_raw(&product_id).await;
    relay_outcome(outcome)
}

/// Map a relay attempt onto the wire: verbatim pass-through on success,
/// structured envelope on failure. Every answer carries `no-store`.
fn relay_outcome(outcome: Result<(u16, Value), UpstreamError>) -> HttpResponse {
    match outcome {
        Ok((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
            HttpResponse::build(status)
                .insert_header((CACHE_CONTROL, "no-store"))
                .json(body)
        }
        Err(UpstreamError::Status(status)) => HttpResponse::BadGateway()
            .insert_header((CACHE_CONTROL, "no-store"))
            .json(json!({ "ok": false, "error": "upstream_error", "status": status })),
        Err(err) => {
            warn!("Spread relay failed: {}", err);
            HttpResponse::InternalServerError()
                .insert_header((CACHE_CONTROL, "no-store"))
                .json(json!({ "ok": false, "error": "server_error" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_success_relays_body_verbatim() {
        let upstream_body = json!({
            "ok": true,
            "product_id": "angeles_12",
            "result": [{"position": "Presente", "positionIndex": 0,
                        "card": {"id": "c1", "name": "El Sol", "meaning": "Luz."}}]
        });
        let response = relay_outcome(Ok((200, upstream_body.clone())));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            "no-store"
        );
        assert_eq!(body_json(response).await, upstream_body);
    }

    #[actix_web::test]
    async fn test_upstream_status_is_preserved_on_success() {
        let response = relay_outcome(Ok((201, json!({"ok": true, "result": []}))));
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_upstream_failure_maps_to_bad_gateway() {
        let response = relay_outcome(Err(UpstreamError::Status(503)));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["error"], json!("upstream_error"));
        assert_eq!(body["status"], json!(503));
    }

    #[actix_web::test]
    async fn test_network_failure_maps_to_server_error() {
        let response = relay_outcome(Err(UpstreamError::Network("connection refused".to_string())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "ok": false, "error": "server_error" }));
    }

    #[actix_web::test]
    async fn test_malformed_body_maps_to_server_error() {
        let response = relay_outcome(Err(UpstreamError::Malformed("expected value".to_string())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("server_error"));
    }
}
