// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::content::ContentError;
use crate::gate::AccessDenied;
use crate::iam::UserServiceError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error, web};
use serde::Serialize;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a JSON endpoint. Every variant renders as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// Detail is logged, never sent to the client.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::Internal(detail.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                INTERNAL_ERROR_MESSAGE
            }
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::NotFound(message) => message.as_str(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error: message })
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(message) | ContentError::Duplicate(message) => {
                ApiError::BadRequest(message)
            }
            ContentError::Unauthorized(message) => ApiError::Unauthorized(message),
            ContentError::NotFound(message) => ApiError::NotFound(message),
            ContentError::Storage(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        ApiError::Unauthorized(denied.to_string())
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Undecodable JSON bodies are reported as internal errors with the generic message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

fn json_error_handler(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    ApiError::internal(format!("Malformed JSON body on {}: {}", req.path(), err)).into()
}

/// Malformed query strings (an unknown `status`, a non-numeric `limit`) are 400s.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        ApiError::bad_request(format!("Invalid query on {}: {}", req.path(), err)).into()
    })
}
