//! HTTP client for the Trackit Gateway and the chat proxy.

mod error;
mod summary;

pub use error::GatewayError;
pub use summary::{ContentKind, SummaryPayload};

use crate::model::{ControllerConfig, LogFilename, Message, NotebookName, Provider, RunStarted, StatusReport};
use error::{extract_detail, DetailRule};
use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const JSON: &str = "application/json";

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    notebook: &'a str,
    json: bool,
    debounce: f64,
}

#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    filename: &'a str,
    provider: Provider,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    provider: Provider,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    reply: String,
}

/// Cheap to clone; every in-flight request gets its own copy.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    chat_url: String,
}

impl GatewayClient {
    pub fn new(cfg: &ControllerConfig) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            chat_url: cfg.chat_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_notebooks(&self) -> Result<Vec<NotebookName>, GatewayError> {
        self.get_json("/getNotebooks").await
    }

    pub async fn list_logs(&self) -> Result<Vec<LogFilename>, GatewayError> {
        self.get_json("/getLogs").await
    }

    pub async fn status(&self) -> Result<StatusReport, GatewayError> {
        self.get_json("/trackit/status").await
    }

    pub async fn run(&self, notebook: &str) -> Result<RunStarted, GatewayError> {
        let resp = self
            .http
            .post(self.endpoint("/trackit/run"))
            .header(ACCEPT, JSON)
            .json(&RunRequest {
                notebook,
                json: false,
                debounce: 0.5,
            })
            .send()
            .await?;
        let resp = ensure_success(resp, DetailRule::Detail).await?;
        decode_json(resp, "/trackit/run").await
    }

    pub async fn stop(&self) -> Result<(), GatewayError> {
        let resp = self.http.post(self.endpoint("/trackit/stop")).send().await?;
        ensure_success(resp, DetailRule::RawText).await?;
        Ok(())
    }

    pub async fn summarize(&self, filename: &str, provider: Provider) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(self.endpoint("/summary"))
            .header(ACCEPT, JSON)
            .json(&SummaryRequest { filename, provider })
            .send()
            .await?;
        let resp = ensure_success(resp, DetailRule::DetailOrMessage).await?;
        let kind = ContentKind::from_headers(resp.headers());
        let body = resp.bytes().await?;
        Ok(SummaryPayload::decode(kind, body)?.into_text())
    }

    /// Forward the conversation to the chat proxy and return its reply.
    pub async fn chat(&self, provider: Provider, messages: &[Message]) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(&self.chat_url)
            .json(&ChatRequest { provider, messages })
            .send()
            .await?;
        let resp = ensure_success(resp, DetailRule::RawText).await?;
        let reply: ChatReply = decode_json(resp, "/api/chat").await?;
        Ok(reply.reply)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, GatewayError> {
        let resp = self
            .http
            .get(self.endpoint(path))
            .header(ACCEPT, JSON)
            .send()
            .await?;
        let resp = ensure_success(resp, DetailRule::Detail).await?;
        decode_json(resp, path).await
    }
}

async fn ensure_success(resp: Response, rule: DetailRule) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let kind = ContentKind::from_headers(resp.headers());
    // An unreadable body still has a status worth reporting.
    let body = resp.bytes().await.unwrap_or_default();
    Err(status_error(status, extract_detail(rule, kind, &body, status.as_u16())))
}

fn status_error(status: StatusCode, message: String) -> GatewayError {
    GatewayError::Status {
        status: status.as_u16(),
        message,
    }
}

async fn decode_json<T: DeserializeOwned>(resp: Response, endpoint: &'static str) -> Result<T, GatewayError> {
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| GatewayError::Decode { endpoint, source })
}
