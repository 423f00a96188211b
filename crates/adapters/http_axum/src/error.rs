//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use nightrelay_domain::error::NightRelayError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`NightRelayError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(NightRelayError);

impl From<NightRelayError> for ApiError {
    fn from(err: NightRelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            NightRelayError::Rejected(rejection) => {
                (StatusCode::FORBIDDEN, rejection.message.clone())
            }
            NightRelayError::Corrupt(err) => {
                tracing::error!(key = err.key, reason = %err.reason, "corrupt stored value");
                internal()
            }
            NightRelayError::OutOfRange(err) => {
                tracing::error!(error = %err, "deadline out of range");
                internal()
            }
            NightRelayError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                internal()
            }
            NightRelayError::Upstream(err) => {
                tracing::error!(error = %err, "upstream error");
                internal()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use nightrelay_domain::error::{CorruptValueError, PolicyRejection};

    async fn render(err: NightRelayError) -> (StatusCode, serde_json::Value) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn should_map_rejection_to_forbidden_with_message() {
        let (status, body) = render(
            PolicyRejection {
                message: "closed".to_string(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "closed");
    }

    #[tokio::test]
    async fn should_hide_corrupt_value_details() {
        let (status, body) = render(
            CorruptValueError {
                key: "state",
                reason: "bad".to_string(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }

    #[tokio::test]
    async fn should_hide_storage_details() {
        let (status, body) = render(NightRelayError::Storage("disk full".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }
}
