//! HTTP error types for the console server.
//!
//! Every rejection produces a JSON body with a machine-readable `error`
//! field and a human-readable `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// A request the gateway refused before it reached a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayRejection {
    /// State-changing request whose `Origin` does not match its `Host`.
    CrossOrigin,
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for GatewayRejection {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::CrossOrigin => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "cross-origin request rejected".to_owned(),
            ),
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}
