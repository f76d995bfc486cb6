//! Turning page contexts into response bodies.
//!
//! Templates are named but not interpreted here. The bundled [`JsonRenderer`]
//! serializes the template name and its context, which is what API clients and
//! the integration tests consume.
use anyhow::Context;
use axum::{
    body::Bytes,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::errors::RequestError;

pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: serde_json::Value) -> Result<Bytes, RequestError>;
    fn content_type(&self) -> &'static str;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct Page<'a> {
    template: &'a str,
    context: serde_json::Value,
}

impl Renderer for JsonRenderer {
    fn render(&self, template: &str, context: serde_json::Value) -> Result<Bytes, RequestError> {
        let body = serde_json::to_vec(&Page { template, context })
            .with_context(|| format!("could not render {template}"))?;
        Ok(Bytes::from(body))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

/// A rendered page, ready to be sent.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub content_type: &'static str,
    pub body: Bytes,
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        ([(CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

pub fn render_page<T: Serialize>(
    renderer: &dyn Renderer,
    template: &str,
    context: &T,
) -> Result<Rendered, RequestError> {
    let context = serde_json::to_value(context)
        .with_context(|| format!("could not serialize context for {template}"))?;
    Ok(Rendered {
        content_type: renderer.content_type(),
        body: renderer.render(template, context)?,
    })
}
