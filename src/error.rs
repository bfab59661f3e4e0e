use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};

/// Enrollment structures that no amount of restarting can place.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("course with a blank subject name")]
    UnnamedCourse,

    #[error("course '{course}' has no enrolled students")]
    EmptyEnrollment { course: String },

    #[error("student {student} is enrolled in {courses} courses but the week only hosts {capacity}")]
    OverSubscribed {
        student: String,
        courses: usize,
        capacity: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster upload contained no files")]
    NoFiles,

    #[error("roster file '{file}' is not valid UTF-8")]
    Encoding { file: String },

    #[error("roster file '{file}' has an unreadable student table: {source}")]
    Table {
        file: String,
        #[source]
        source: polars::prelude::PolarsError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    MalformedInput(InputError),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::MalformedInput(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("MALFORMED_INPUT", e.to_string()),
            ),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", msg),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<InputError> for AppError {
    fn from(e: InputError) -> Self {
        AppError::MalformedInput(e)
    }
}

impl From<RosterError> for AppError {
    fn from(e: RosterError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
