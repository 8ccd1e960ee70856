//! Response bodies and error mapping.
//!
//! # Responsibilities
//! - Render the `{result, _id}` success envelope for update and delete
//! - Map every API error to its status code and `{error, _id?}` body
//!
//! # Design Decisions
//! - Validation and not-found outcomes are HTTP 200 with an `error` field,
//!   which existing clients depend on
//! - Only retrieval and creation failures surface as HTTP 500
//! - Bodies that are not an object or form are 400, oversized bodies 413
//! - Store error details are logged by the handler, never rendered

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::issues::ValidationError;

/// Every failure the issue API can report. `Display` is the wire message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("required field(s) missing")]
    RequiredFieldsMissing,

    #[error("missing _id")]
    MissingId,

    #[error("no update field(s) sent")]
    NoUpdateFields { id: String },

    #[error("could not update")]
    CouldNotUpdate { id: String },

    #[error("could not delete")]
    CouldNotDelete { id: String },

    #[error("could not retreive issues")]
    CouldNotRetrieve,

    #[error("could not create issue")]
    CouldNotCreate,

    #[error("invalid request body")]
    InvalidBody,

    #[error("request body too large")]
    BodyTooLarge,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::CouldNotRetrieve | ApiError::CouldNotCreate => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::OK,
        }
    }

    fn id(&self) -> Option<&str> {
        match self {
            ApiError::NoUpdateFields { id }
            | ApiError::CouldNotUpdate { id }
            | ApiError::CouldNotDelete { id } => Some(id),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldsMissing => ApiError::RequiredFieldsMissing,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            id: self.id(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Success envelope for update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub result: &'static str,
    #[serde(rename = "_id")]
    pub id: String,
}

impl Outcome {
    pub fn updated(id: impl Into<String>) -> Self {
        Self {
            result: "successfully updated",
            id: id.into(),
        }
    }

    pub fn deleted(id: impl Into<String>) -> Self {
        Self {
            result: "successfully deleted",
            id: id.into(),
        }
    }
}
