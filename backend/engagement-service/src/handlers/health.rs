/// Liveness and readiness probes
use actix_web::{web, HttpResponse};

use crate::repository::EntityStore;
use crate::state::AppState;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Ready once the entity store answers
pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    match state.entities().ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "ready" })),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unavailable",
                "error": err.to_string(),
            }))
        }
    }
}
