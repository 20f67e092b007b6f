use crate::service::error::{ServiceError, ServiceErrorKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common_http_server_rs::ApiResponse;
use serde_json::Value;

fn status_code_for(kind: ServiceErrorKind) -> StatusCode {
    match kind {
        ServiceErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ServiceErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ServiceErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ServiceErrorKind::NotFound => StatusCode::NOT_FOUND,
        ServiceErrorKind::Conflict => StatusCode::CONFLICT,
        ServiceErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ServiceErrorKind::BadGateway => StatusCode::BAD_GATEWAY,
        ServiceErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ServiceErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_code_for(self.kind());
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.message(), "Request failed");
        }
        ApiResponse::<Value>::error_with_status(self.message().to_string(), status).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_its_status() {
        let cases = [
            (ServiceError::bad_request("x"), StatusCode::BAD_REQUEST),
            (ServiceError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ServiceError::forbidden("x"), StatusCode::FORBIDDEN),
            (ServiceError::not_found("x"), StatusCode::NOT_FOUND),
            (ServiceError::conflict("x"), StatusCode::CONFLICT),
            (
                ServiceError::new(ServiceErrorKind::PayloadTooLarge, "x"),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (ServiceError::bad_gateway("x"), StatusCode::BAD_GATEWAY),
            (ServiceError::unavailable("x"), StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
