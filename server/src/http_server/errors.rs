use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use color_eyre::Report;
use db::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ServerError(pub(crate) Report, pub(crate) StatusCode);

impl ServerError {
    pub(crate) fn status(&self) -> StatusCode {
        self.1
    }

    fn message(&self) -> String {
        if let Some(validation) = find_validation_error(&self.0) {
            return validation.to_string();
        }

        if self.1.is_client_error() {
            format!("{:#}", self.0)
        } else {
            self.0.to_string()
        }
    }
}

fn find_validation_error(report: &Report) -> Option<&ValidationError> {
    report
        .chain()
        .find_map(|err| err.downcast_ref::<ValidationError>())
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            sentry::capture_error(&self);

            tracing::error!(error = ?self.0, %status, "ServerError");
        } else {
            tracing::info!(error = %self.0, %status, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Bad input becomes a 400 and constraint conflicts a 409. Anything else is on us.
impl From<Report> for ServerError {
    fn from(err: Report) -> Self {
        let status = if find_validation_error(&err).is_some() {
            StatusCode::BAD_REQUEST
        } else if db::is_unique_violation(&err) {
            StatusCode::CONFLICT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        ServerError(err, status)
    }
}

pub(crate) trait WithStatus<T> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError>;
}

impl<T> WithStatus<T> for Result<T, Report> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError> {
        self.map_err(|err| ServerError(err, status))
    }
}
