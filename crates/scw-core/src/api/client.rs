use async_trait::async_trait;

use crate::{
    api::types::{HistoryResponse, PollResponse},
    domain::Cursor,
    Result,
};

/// Port for the support server's HTTP surface.
///
/// Scoping (token, optional ticket-in-path) is adapter state, so the same
/// interface covers deployments with and without a ticket segment. The
/// first implementation is `reqwest`-based; test fakes script responses
/// behind the same trait.
#[async_trait]
pub trait SupportApi: Send + Sync {
    /// Send an outbound message. The result is surfaced so callers can
    /// keep unsent input around on failure.
    async fn send_message(&self, text: &str) -> Result<()>;

    /// Close the support ticket. The conversation is over once this
    /// succeeds; the session ends afterwards.
    async fn close_thread(&self) -> Result<()>;

    /// The server's current clock, used once to seed the cursor.
    async fn server_timestamp(&self) -> Result<f64>;

    /// The existing conversation backlog, rendered before polling starts.
    async fn history(&self) -> Result<HistoryResponse>;

    /// Long-poll for messages newer than `cursor`. The server holds the
    /// request until new data exists or its wait bound elapses, then
    /// responds (possibly with an empty list) carrying a fresh timestamp.
    async fn poll(&self, cursor: Cursor) -> Result<PollResponse>;
}
