//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Open a tracing span per request carrying that ID
//! - Extract issue bodies from JSON or URL-encoded forms
//!
//! # Design Decisions
//! - Request ID set before tracing so every log line carries it
//! - An empty body is an empty object, whatever the content type
//! - Unknown content types with a body are parsed as JSON
//! - A body over the size limit is 413; any other rejection is 400

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    Form, Json,
};
use serde::de::DeserializeOwned;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

use crate::http::response::ApiError;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Span for one request, tagged with its ID.
pub fn request_span(request: &axum::http::Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Body extractor accepting JSON or URL-encoded form payloads.
#[derive(Debug, Clone, Default)]
pub struct IssueBody<T>(pub T);

impl<S, T> FromRequest<S> for IssueBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| body_rejection(e.status(), &e))?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| body_rejection(e.status(), &e))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes).map_err(|e| {
            tracing::debug!(error = %e, "Rejected JSON body");
            ApiError::InvalidBody
        })?;
        Ok(Self(value))
    }
}

fn body_rejection(status: StatusCode, detail: &dyn std::fmt::Display) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::debug!(error = %detail, "Request body over size limit");
        ApiError::BodyTooLarge
    } else {
        tracing::debug!(error = %detail, "Rejected request body");
        ApiError::InvalidBody
    }
}
