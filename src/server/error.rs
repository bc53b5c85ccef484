use crate::backup::BackupError;
use crate::database::DatabaseError;
use crate::report::ReportError;
use crate::results::ResultsError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

/// Query value that makes the process list show the "not finalized" warning
pub const NOT_FINALIZED_CODE: &str = "proceso_no_finalizado";

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Results requested for a process that is not finalized
    NotFinalized,
    Unauthorized,
    Internal(String),
}

impl From<ResultsError> for AppError {
    fn from(error: ResultsError) -> Self {
        match error {
            ResultsError::NotFinalized { .. } => AppError::NotFinalized,
            ResultsError::ProcessNotFound(_) => AppError::NotFound(error.to_string()),
            ResultsError::Database(e) => AppError::from(e),
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(error: DatabaseError) -> Self {
        AppError::Internal(error.to_string())
    }
}

impl From<ReportError> for AppError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::Results(e) => AppError::from(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<BackupError> for AppError {
    fn from(error: BackupError) -> Self {
        match error {
            BackupError::NotConfigured | BackupError::Missing(_) => {
                AppError::NotFound(error.to_string())
            }
            BackupError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            AppError::NotFinalized => {
                Redirect::to(&format!("/procesos?warning={}", NOT_FINALIZED_CODE)).into_response()
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                "Autenticación requerida",
            )
                .into_response(),
            AppError::Internal(message) => {
                log::error!("Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor",
                )
                    .into_response()
            }
        }
    }
}
