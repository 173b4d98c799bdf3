use crate::data::input::{Field, FieldErrors, Rule};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use snafu::Snafu;
use std::num::ParseIntError;

pub type StudentsResult<T> = Result<T, StudentsError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StudentsError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unknown student store {:?}, expected `postgres` or `memory`", found))]
    UnknownStoreKind { found: String },
    #[snafu(display("Validation failed"))]
    Validation { errors: FieldErrors },
    #[snafu(display("Student ID {:?} is already taken", student_id))]
    DuplicateStudentId { student_id: String },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: i64 },
    #[snafu(display("Error reading request body"))]
    RequestBody { source: JsonRejection },
    #[snafu(display("Error reading student ID from the path"))]
    RequestPath { source: PathRejection },
    #[snafu(display("Error sending request to the students API"))]
    SendRequest { source: reqwest::Error },
    #[snafu(display("Error decoding students API response"))]
    DecodeResponse { source: reqwest::Error },
    #[snafu(display("Students API responded with {}: {}", status, message))]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        message: String,
    },
}

impl StudentsError {
    pub fn during(self, action: StudentAction) -> ActionError {
        ActionError {
            action,
            error: self,
        }
    }

    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StudentAction {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

impl StudentAction {
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Error listing students",
            Self::Fetch => "Error fetching student",
            Self::Create => "Error creating student",
            Self::Update => "Error updating student",
            Self::Delete => "Error deleting student",
        }
    }
}

/// An error from the JSON API, along with what the caller was trying to do.
#[derive(Debug)]
pub struct ActionError {
    pub action: StudentAction,
    pub error: StudentsError,
}

impl IntoResponse for ActionError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::UNPROCESSABLE_ENTITY; //bad input

        let Self { action, error } = self;

        let status_code = match &error {
            StudentsError::Validation { .. } | StudentsError::DuplicateStudentId { .. } => BI,
            StudentsError::MissingStudent { .. } => NF,
            StudentsError::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            StudentsError::RequestBody { source } => source.status(),
            StudentsError::RequestPath { source } => source.status(),
            StudentsError::OpenDatabase { .. } | StudentsError::MigrateError { .. } => ISE,
            StudentsError::BadEnvVar { .. }
            | StudentsError::ParsePort { .. }
            | StudentsError::UnknownStoreKind { .. } => ISE,
            StudentsError::SendRequest { .. }
            | StudentsError::DecodeResponse { .. }
            | StudentsError::UnexpectedStatus { .. } => ISE,
        };

        if status_code.is_server_error() {
            error!(?error, ?action, "Error!");
        } else {
            debug!(?error, ?action, "Request refused");
        }

        let body = match error {
            StudentsError::Validation { errors } => json!({
                "message": "Validation failed",
                "errors": errors,
            }),
            StudentsError::DuplicateStudentId { .. } => json!({
                "message": "Validation failed",
                "errors": FieldErrors::single(Field::StudentId, Rule::Unique),
            }),
            other => json!({
                "message": action.failure_message(),
                "error": other.to_string(),
            }),
        };

        (status_code, Json(body)).into_response()
    }
}
