//! HTTP boundary. Turns a [`RequestDescriptor`] into either a 2xx response or
//! a normalized [`ApiFailure`]; never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use nbhub_core::config::ApiConfig;
use nbhub_core::ApiFailure;
use nbhub_core::SessionContext;

use crate::contracts::ApiResponse;
use crate::contracts::Method;
use crate::contracts::RequestBody;
use crate::contracts::RequestDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse, ApiFailure>;
}

#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    session: SessionContext,
}

impl ReqwestClient {
    pub fn new(config: &ApiConfig, session: SessionContext) -> Result<Self, ClientBuildError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { client, session })
    }

    fn build(&self, request: RequestDescriptor) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, request.url);

        if request.authenticated {
            if let Some(header) = self.session.authorization_header() {
                builder = builder.header(AUTHORIZATION, header);
            }
        }

        match request.body {
            RequestBody::None | RequestBody::Unencodable(_) => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(files) => {
                let form = files.into_iter().fold(Form::new(), |form, file| {
                    let part = Part::bytes(file.bytes).file_name(file.file_name);
                    form.part(file.field, part)
                });
                builder.multipart(form)
            }
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse, ApiFailure> {
        if let Some(failure) = request.encoding_failure() {
            return Err(failure);
        }
        let method = request.method.label();
        let url = request.url.clone();

        let response = self.build(request).send().await.map_err(|err| {
            warn!(method, %url, error = %err, "request failed before a response");
            ApiFailure::transport(err.to_string())
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            warn!(method, %url, error = %err, "response body unreadable");
            ApiFailure::transport(err.to_string())
        })?;
        debug!(method, %url, status = status.as_u16(), "response");

        let body = parse_body(&text);
        if status.is_success() {
            Ok(ApiResponse::new(status.as_u16(), body))
        } else {
            Err(ApiFailure::new(Some(status.as_u16()), body))
        }
    }
}

/// JSON bodies pass through; anything else is wrapped as `{"detail": text}`.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "detail": text.trim() }))
}
