use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use tracing::{error, warn};

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::ImageDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::ModelLoad(_)
        | DomainError::Inference(_)
        | DomainError::Storage(_)
        | DomainError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Logs the failure and returns the status plus the user facing message.
pub fn report(err: &DomainError) -> (StatusCode, String) {
    let status = status_for(err);
    if status.is_server_error() {
        error!("Request failed: {err}");
    } else {
        warn!("Request rejected: {err}");
    }
    (status, err.user_message())
}

/// JSON error body for the `/api` routes.
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = report(&self.0);
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_variant_to_its_status() {
        let cases = [
            (DomainError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::ImageDecode("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::ModelLoad("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::Inference("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::OperationFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }
}
