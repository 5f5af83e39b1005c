use axum::{
    Json,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use hypertext::Rendered;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::competitions::scoring::ScoringError;

pub fn see_other_ok(r: Redirect) -> StandardResponse {
    Ok(SuccessResponse::SeeOther(r))
}

pub fn err_not_found() -> StandardResponse {
    Err(FailureResponse::NotFound(()))
}

pub fn bad_request(html: Rendered<String>) -> StandardResponse {
    Err(FailureResponse::BadRequest(html))
}

pub fn bad_request_json(msg: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::BadRequestJson(msg.into()))
}

pub fn success(html: Rendered<String>) -> StandardResponse {
    Ok(SuccessResponse::Success(html))
}

pub fn json_ok<T: Serialize>(value: T) -> StandardResponse {
    Ok(SuccessResponse::Json(to_value(value)?))
}

pub fn json_created<T: Serialize>(value: T) -> StandardResponse {
    Ok(SuccessResponse::Created(to_value(value)?))
}

pub fn unauthorized() -> StandardResponse {
    Err(FailureResponse::Unauthorized(()))
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, FailureResponse> {
    serde_json::to_value(value).map_err(|e| {
        error!("failed to serialize response body: {e}");
        FailureResponse::ServerError(())
    })
}

pub type StandardResponse = Result<SuccessResponse, FailureResponse>;

pub enum SuccessResponse {
    Success(Rendered<String>),
    SeeOther(Redirect),
    Json(serde_json::Value),
    Created(serde_json::Value),
    Csv { filename: String, body: String },
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        match self {
            SuccessResponse::Success(html) => {
                Html(html.into_inner()).into_response()
            }
            SuccessResponse::SeeOther(redirect) => redirect.into_response(),
            SuccessResponse::Json(value) => Json(value).into_response(),
            SuccessResponse::Created(value) => {
                (StatusCode::CREATED, Json(value)).into_response()
            }
            SuccessResponse::Csv { filename, body } => (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                body,
            )
                .into_response(),
        }
    }
}

#[derive(Debug)]
pub enum FailureResponse {
    BadRequest(Rendered<String>),
    BadRequestJson(String),
    NotFound(()),
    /// Logged in, but not allowed to do this.
    Unauthorized(()),
    /// Not logged in.
    Unauthenticated(()),
    ServerError(()),
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        match self {
            FailureResponse::BadRequest(html) => {
                (StatusCode::BAD_REQUEST, Html(html.into_inner()))
                    .into_response()
            }
            FailureResponse::BadRequestJson(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
                    .into_response()
            }
            FailureResponse::NotFound(()) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not found" })),
            )
                .into_response(),
            FailureResponse::Unauthorized(()) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "you do not have permission to do that" })),
            )
                .into_response(),
            FailureResponse::Unauthenticated(()) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "you need to log in first" })),
            )
                .into_response(),
            FailureResponse::ServerError(()) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response(),
        }
    }
}

impl From<diesel::result::Error> for FailureResponse {
    fn from(e: diesel::result::Error) -> Self {
        error!("database error: {e}");
        FailureResponse::ServerError(())
    }
}

impl From<diesel::r2d2::PoolError> for FailureResponse {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        error!("could not check out a database connection: {e}");
        FailureResponse::ServerError(())
    }
}

impl From<ScoringError> for FailureResponse {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::Validation(msg) => FailureResponse::BadRequestJson(msg),
            ScoringError::Integrity(msg) => {
                error!("scoring data is inconsistent: {msg}");
                FailureResponse::ServerError(())
            }
        }
    }
}
