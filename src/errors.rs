use std::{collections::BTreeMap, fmt};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::JsonResponse;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    NotFound(&'static str),
    /// Anonymous caller on a gated route. Carries the login URL with the
    /// `next` parameter already filled in.
    #[error("authentication required")]
    AuthRequired { login_redirect: String },
    /// The caller may not touch this resource and is sent back to it instead.
    #[error("permission denied")]
    PermissionDenied { redirect_to: String },
    #[error("{0}")]
    NotAuthorized(&'static str),
    #[error("invalid form: {0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    RunTimeError(&'static str),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Field name to messages, in the shape forms are re-rendered with.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when no field failed, a VALIDATION error otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, RequestError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(RequestError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(", "))?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RequestErrorJsonWrapper {
    errors: BTreeMap<String, Vec<String>>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        let mut errors = BTreeMap::new();
        errors.insert("body".to_owned(), vec![error.to_string()]);
        RequestErrorJsonWrapper { errors }
    }

    pub fn from_fields(fields: &FieldErrors) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            errors: fields
                .0
                .iter()
                .map(|(field, messages)| (field.to_string(), messages.clone()))
                .collect(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::AuthRequired { login_redirect } => {
                Redirect::to(&login_redirect).into_response()
            }
            RequestError::PermissionDenied { redirect_to } => {
                Redirect::to(&redirect_to).into_response()
            }
            other => other.to_json_response().into_response(),
        }
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::NotFound(message) => {
                (StatusCode::NOT_FOUND, RequestErrorJsonWrapper::new(message))
            }
            RequestError::AuthRequired { .. } => (
                StatusCode::UNAUTHORIZED,
                RequestErrorJsonWrapper::new("Authentication required"),
            ),
            RequestError::PermissionDenied { .. } => (
                StatusCode::FORBIDDEN,
                RequestErrorJsonWrapper::new("Forbidden"),
            ),
            RequestError::NotAuthorized(message) => (
                StatusCode::UNAUTHORIZED,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RequestErrorJsonWrapper::from_fields(fields),
            ),
            RequestError::RunTimeError(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::Internal(e) => {
                tracing::error!(error = ?e, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
        };
        (status_code, Json(json))
    }
}
