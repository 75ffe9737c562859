//! Error handler for matcha.

use axum::extract::rejection::FormRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::router::profile::Fields;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    /// Profile submission failed field rules; the submitted values are echoed
    /// back so the form can be re-rendered as filled.
    #[error("profile submission rejected")]
    Profile {
        errors: ValidationErrors,
        form: Fields,
    },

    #[error(transparent)]
    Axum(#[from] FormRejection),

    #[error("identity handshake failed: {0}")]
    Identity(#[from] crate::identity::IdentityError),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("session token failure: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("system clock before unix epoch")]
    Clock(#[from] std::time::SystemTimeError),

    #[error("authentication required")]
    Unauthorized,
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
    form: Option<Fields>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Echo submitted profile fields back to the caller.
    pub fn form(mut self, fields: Fields) -> Self {
        self.form = Some(fields);
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
            form: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => response.errors(validation_errors),

            ServerError::Profile { errors, form } => response.errors(errors).form(form.clone()),

            ServerError::Axum(err) => response
                .title("Server error during data parsing.")
                .details(&err.to_string()),

            ServerError::Identity(_) => response.title("Identity handshake failed."),

            ServerError::Unauthorized => response
                .title("Authentication required.")
                .status(StatusCode::UNAUTHORIZED),

            // Store and session failures are fatal to the request: log the
            // cause, answer with a generic failure.
            ServerError::Sql(err) => {
                tracing::error!(error = %err, "store failure");
                ResponseError::default()
            }

            ServerError::Token(err) => {
                tracing::error!(error = %err, "session token failure");
                ResponseError::default()
            }

            ServerError::Clock(err) => {
                tracing::error!(error = %err, "clock failure");
                ResponseError::default()
            }
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
                "form": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
