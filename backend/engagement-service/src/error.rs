/// Error types for engagement-service
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::TargetKind;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The parent record is gone but dependent edges or comments may remain.
    #[error("Cascade incomplete after deleting {kind} {entity_id}: {source}")]
    CascadeIncomplete {
        kind: TargetKind,
        entity_id: Uuid,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn cascade_incomplete(kind: TargetKind, entity_id: Uuid, source: ServiceError) -> Self {
        ServiceError::CascadeIncomplete {
            kind,
            entity_id,
            source: Box::new(source),
        }
    }

    /// Stable taxonomy name rendered into error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::InvalidInput(_) => "invalid",
            ServiceError::CascadeIncomplete { .. } => "cascade_incomplete",
            ServiceError::Database(_) => "database",
            ServiceError::Config(_) => "config",
            ServiceError::Internal(_) => "internal",
        }
    }

    /// Message safe to send to clients. Server-side failures keep their
    /// detail in the logs only.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::CascadeIncomplete {
                kind, entity_id, ..
            } => format!(
                "{} {} was deleted but cleanup did not finish; a repair sweep is scheduled",
                kind, entity_id
            ),
            ServiceError::Database(_) | ServiceError::Config(_) | ServiceError::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ServiceError::Conflict(db_err.message().to_string());
            }
        }
        ServiceError::Database(err)
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::CascadeIncomplete { .. }
            | ServiceError::Database(_)
            | ServiceError::Config(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "request failed: {}", self);
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.public_message(),
            "kind": self.kind(),
            "status": status.as_u16(),
        }))
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::NotFound("video".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Forbidden("owner".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Conflict("edge".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InvalidInput("kind".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_rt::test]
    async fn test_server_errors_hide_detail_from_clients() {
        let err = ServiceError::from(sqlx::Error::Protocol(
            "relation \"reactions\" does not exist".into(),
        ));
        assert_eq!(err.kind(), "database");

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["kind"], "database");
        assert!(!String::from_utf8_lossy(&body).contains("reactions"));

        let cascade = ServiceError::cascade_incomplete(
            TargetKind::Video,
            Uuid::new_v4(),
            ServiceError::Internal("pool exhausted".into()),
        );
        assert!(!cascade.public_message().contains("pool exhausted"));
        assert_eq!(
            ServiceError::NotFound("video 1".into()).public_message(),
            "Not found: video 1"
        );
    }

    #[test]
    fn test_cascade_incomplete_keeps_cause() {
        let id = Uuid::new_v4();
        let err = ServiceError::cascade_incomplete(
            TargetKind::Video,
            id,
            ServiceError::Internal("edge store unavailable".into()),
        );

        assert_eq!(err.kind(), "cascade_incomplete");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let msg = err.to_string();
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("edge store unavailable"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
