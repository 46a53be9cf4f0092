use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Ledger(#[from] ledger_core::Error),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Ledger(e) if e.is_rejection() => StatusCode::BAD_REQUEST,
            GatewayError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Ledger(e) => e.kind(),
            GatewayError::BadRequest(_) => "validation_error",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "kind": self.kind(),
                "timestamp": Utc::now(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::SignatureFailure;

    #[test]
    fn test_status_mapping() {
        let validation = GatewayError::from(ledger_core::Error::Validation("bad".into()));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.kind(), "validation_error");

        let signature = GatewayError::from(ledger_core::Error::from(
            SignatureFailure::InvalidSignature,
        ));
        assert_eq!(signature.status(), StatusCode::BAD_REQUEST);
        assert_eq!(signature.kind(), "signature_error");

        let storage = GatewayError::from(ledger_core::Error::Storage("disk".into()));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            GatewayError::NotFound("key".into()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
