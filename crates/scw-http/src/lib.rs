//! `reqwest` adapter for the support server API.
//!
//! Endpoint shape, scoped by token and (on most deployments) ticket:
//!
//! ```text
//! POST {base}/{token}[/{ticket}]/send_message      body: message=<urlencoded>
//! GET  {base}/{token}[/{ticket}]/close_thread
//! GET  {base}/{token}/get_timestamp
//! GET  {base}/{token}[/{ticket}]/get_messages
//! GET  {base}/{token}[/{ticket}]/polling/{cursor}?wait_for={secs}
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use scw_core::{
    api::{
        client::SupportApi,
        types::{HistoryResponse, PollResponse, TimestampResponse},
    },
    config::Config,
    domain::{Cursor, TicketId, Token},
    errors::Error,
    Result,
};

/// The one configurable HTTP client covering both deployment shapes
/// (ticket in the path, or ticket folded into the token).
pub struct HttpSupportApi {
    base_url: String,
    token: Token,
    ticket: Option<TicketId>,
    include_ticket_in_path: bool,
    poll_wait_secs: u64,
    /// Unary calls, short timeout.
    http: reqwest::Client,
    /// Long-poll calls; timeout sized to the server's hold bound.
    poll_http: reqwest::Client,
}

impl HttpSupportApi {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| Error::Transport(format!("http client build failed: {e}")))?;
        let poll_http = reqwest::Client::builder()
            .timeout(cfg.poll_timeout())
            .build()
            .map_err(|e| Error::Transport(format!("http client build failed: {e}")))?;

        Ok(Self {
            base_url: cfg.base_url.clone(),
            token: cfg.token.clone(),
            ticket: cfg.ticket.clone(),
            include_ticket_in_path: cfg.include_ticket_in_path,
            poll_wait_secs: cfg.poll_wait.as_secs(),
            http,
            poll_http,
        })
    }

    /// `{base}/{token}` or `{base}/{token}/{ticket}`.
    fn scope(&self) -> String {
        match &self.ticket {
            Some(t) if self.include_ticket_in_path => {
                format!("{}/{}/{}", self.base_url, self.token.0, t.0)
            }
            _ => format!("{}/{}", self.base_url, self.token.0),
        }
    }

    fn endpoint(&self, tail: &str) -> String {
        format!("{}/{}", self.scope(), tail)
    }

    /// The timestamp endpoint is token-scoped only, on every deployment.
    fn timestamp_endpoint(&self) -> String {
        format!("{}/{}/get_timestamp", self.base_url, self.token.0)
    }

    fn polling_endpoint(&self, cursor: Cursor) -> String {
        format!(
            "{}/polling/{}?wait_for={}",
            self.scope(),
            cursor,
            self.poll_wait_secs
        )
    }

    fn form_body(text: &str) -> String {
        format!("message={}", urlencoding::encode(text))
    }

    async fn get_json<T: DeserializeOwned>(&self, client: &reqwest::Client, url: &str) -> Result<T> {
        debug!("GET {url}");
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("GET {url} returned {status}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("GET {url} body read failed: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Protocol(format!("undecodable body from {url}: {e}")))
    }
}

#[async_trait]
impl SupportApi for HttpSupportApi {
    async fn send_message(&self, text: &str) -> Result<()> {
        let url = self.endpoint("send_message");
        debug!("POST {url}");
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Self::form_body(text))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("POST {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("POST {url} returned {status}")));
        }
        Ok(())
    }

    async fn close_thread(&self) -> Result<()> {
        let url = self.endpoint("close_thread");
        debug!("GET {url}");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("GET {url} returned {status}")));
        }
        Ok(())
    }

    async fn server_timestamp(&self) -> Result<f64> {
        let resp: TimestampResponse = self
            .get_json(&self.http, &self.timestamp_endpoint())
            .await?;
        Ok(resp.timestamp)
    }

    async fn history(&self) -> Result<HistoryResponse> {
        self.get_json(&self.http, &self.endpoint("get_messages"))
            .await
    }

    async fn poll(&self, cursor: Cursor) -> Result<PollResponse> {
        self.get_json(&self.poll_http, &self.polling_endpoint(cursor))
            .await
    }
}
