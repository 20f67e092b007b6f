//! Extractors whose rejections render as `ServiceError` envelopes.

use crate::service::error::ServiceError;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A JSON request body. Malformed JSON or a missing JSON content type is a 400.
pub(crate) struct JsonBody(pub(crate) Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(request, state)
            .await
            .map_err(|rejection| ServiceError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query-string parameters; unparsable values are a 400.
pub(crate) struct QueryParams<T>(pub(crate) T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServiceError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// A multipart body; a missing or invalid boundary is a 400.
pub(crate) struct MultipartBody(pub(crate) Multipart);

impl<S> FromRequest<S> for MultipartBody
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(request, state)
            .await
            .map(Self)
            .map_err(|rejection| ServiceError::bad_request(rejection.body_text()))
    }
}
