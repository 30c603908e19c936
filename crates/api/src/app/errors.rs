//! Error responses and the extractors that produce them.
//!
//! Every failure leaves the API in one shape:
//!
//! ```json
//! {"error": {"code": 403, "status": "PERMISSION_DENIED", "message": "...", "details": []}}
//! ```

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error};

use cardhub_core::{DomainError, FieldViolation};

pub const BAD_BODY: &str = "Request body must be a valid JSON.";
pub const BAD_PARAMS: &str = "Request parameters must be a valid type.";

/// Violation description attached to input that could not be decoded.
pub const BINDING_ERROR: &str = "BINDING_ERROR";

/// Client closed request / deadline exceeded (nginx convention).
const CANCELLED: u16 = 499;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

pub fn status_of(err: &DomainError) -> StatusCode {
    match err {
        DomainError::InvalidArgument { .. } | DomainError::FailedPrecondition(_) => {
            StatusCode::BAD_REQUEST
        }
        DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        DomainError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Cancelled => {
            StatusCode::from_u16(CANCELLED).unwrap_or(StatusCode::REQUEST_TIMEOUT)
        }
    }
}

impl ApiError {
    /// `INVALID_ARGUMENT` for input of `part` ("body", "query" or a path
    /// segment) that could not be decoded.
    pub fn binding(message: &str, part: &str) -> Self {
        Self(DomainError::invalid_argument(
            message,
            vec![FieldViolation::new(part, BINDING_ERROR)],
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if let DomainError::Internal(detail) = &err {
            error!(%detail, "internal error");
        }
        let status = status_of(&err);
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "status": err.code(),
                "message": err.public_message(),
                "details": err.violations(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// `Json<T>` with malformed bodies reported as `INVALID_ARGUMENT`.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "rejected request body");
                Err(ApiError::binding(BAD_BODY, "body"))
            }
        }
    }
}

/// `Query<T>` with bad parameters reported as `INVALID_ARGUMENT`.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "rejected query string");
                Err(ApiError::binding(BAD_PARAMS, "query"))
            }
        }
    }
}

/// `Path<T>` with bad segments reported as `INVALID_ARGUMENT`.
pub struct PathParam<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "rejected path parameters");
                Err(ApiError::binding(BAD_PARAMS, "path"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    use crate::app::dto::EmployeeQuery;

    #[test]
    fn http_status_per_code() {
        let cases = [
            (DomainError::invalid_field("remark", "required"), 400),
            (DomainError::unauthenticated("no"), 401),
            (DomainError::permission_denied("no"), 403),
            (DomainError::failed_precondition("no"), 400),
            (DomainError::internal("db down"), 500),
            (DomainError::Cancelled, 499),
        ];
        for (err, status) in cases {
            assert_eq!(status_of(&err).as_u16(), status, "{err:?}");
        }
    }

    #[tokio::test]
    async fn undecodable_input_names_the_part_that_failed() {
        let req = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let Err(ApiError(err)) = JsonBody::<serde_json::Value>::from_request(req, &()).await else {
            panic!("malformed body was accepted");
        };
        assert_eq!(err.public_message(), BAD_BODY);
        assert_eq!(err.violations(), [FieldViolation::new("body", BINDING_ERROR)]);

        let (mut parts, _) = axum::http::Request::builder()
            .uri("/v1/employees?pageSize=lots")
            .body(())
            .unwrap()
            .into_parts();
        let Err(ApiError(err)) =
            QueryParams::<EmployeeQuery>::from_request_parts(&mut parts, &()).await
        else {
            panic!("bad query was accepted");
        };
        assert_eq!(err.violations(), [FieldViolation::new("query", BINDING_ERROR)]);
    }

    #[tokio::test]
    async fn body_carries_status_and_violations() {
        let err = DomainError::invalid_argument(
            "Card request is invalid.",
            vec![FieldViolation::new("phone.number", "phone number must not be empty")],
        );
        let response = ApiError(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], 400);
        assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
        assert_eq!(body["error"]["details"][0]["field"], "phone.number");
    }

    #[tokio::test]
    async fn internal_details_stay_in_the_logs() {
        let response = ApiError(DomainError::internal("password=hunter2")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(text.contains("An internal error occurred."));
    }
}
