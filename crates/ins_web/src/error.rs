use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ins_core::Error;
use serde_json::json;
use tracing::error;

/// Bad query parameters answer 400, every other failure 500, both with
/// `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let bad = ApiError::from(Error::InvalidQuery("Unknown sort field: x".to_string()));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let broken = ApiError::from(Error::Database("locked".to_string()));
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
