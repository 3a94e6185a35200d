//! The chat session: cursor state and the long-poll loop.
//!
//! One poll is in flight at a time; the next request is only issued after
//! the previous response has been handled, so the cursor has a single
//! writer. Failures never advance the cursor: transient transport errors
//! retry with capped backoff and a "reconnecting" indicator, malformed
//! responses are dropped after a short delay.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    api::{
        client::SupportApi,
        types::{WireMessage, WireUser},
    },
    backoff::Backoff,
    config::Config,
    domain::Cursor,
    render::{bubbles_from, ConnectionStatus, RenderSink},
    Result,
};

#[derive(Debug, Default)]
struct SessionState {
    cursor: Option<Cursor>,
    seen: SeenWindow,
    polls: u64,
    rendered: u64,
}

/// Point-in-time view of the session for status output.
#[derive(Clone, Copy, Debug)]
pub struct SessionStats {
    pub cursor: Option<Cursor>,
    pub polls: u64,
    pub rendered: u64,
}

/// High-level client session over the server API and a render sink.
///
/// Owns the only mutable state the protocol needs: the last-seen cursor,
/// assigned exclusively from server responses, plus a bounded window of
/// already-rendered message keys for duplicate suppression.
pub struct ChatSession {
    cfg: Arc<Config>,
    api: Arc<dyn SupportApi>,
    view: Arc<dyn RenderSink>,
    state: Mutex<SessionState>,
}

impl ChatSession {
    pub fn new(cfg: Arc<Config>, api: Arc<dyn SupportApi>, view: Arc<dyn RenderSink>) -> Self {
        let state = SessionState {
            seen: SeenWindow::new(cfg.dedupe_window),
            ..Default::default()
        };
        Self {
            cfg,
            api,
            view,
            state: Mutex::new(state),
        }
    }

    pub async fn stats(&self) -> SessionStats {
        let state = self.state.lock().await;
        SessionStats {
            cursor: state.cursor,
            polls: state.polls,
            rendered: state.rendered,
        }
    }

    /// Send an outbound message. Errors surface to the caller so unsent
    /// input is not silently discarded.
    pub async fn send(&self, text: &str) -> Result<()> {
        self.api.send_message(text).await
    }

    /// Close the support ticket on the server. The caller ends the session
    /// once this returns Ok.
    pub async fn close(&self) -> Result<()> {
        self.api.close_thread().await
    }

    /// Seed the cursor, render the backlog, then poll until cancelled.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let Some(mut cursor) = self.seed_cursor(&cancel).await? else {
            return Ok(());
        };
        info!("session live, cursor {cursor}");

        if self.cfg.fetch_history {
            match self.api.history().await {
                Ok(h) => self.render_new(&h.messages, None).await?,
                // The thread still fills in via polling, just without the
                // pre-existing backlog.
                Err(e) => warn!("backlog fetch failed: {e}"),
            }
        }

        let mut backoff = Backoff::new(self.cfg.retry_base, self.cfg.retry_max);
        let mut connected = true;

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                r = self.api.poll(cursor) => r,
            };

            match polled {
                Ok(resp) => {
                    backoff.reset();
                    if !connected {
                        connected = true;
                        self.view.set_status(ConnectionStatus::Live).await?;
                    }

                    // Adopt the server cursor before rendering; the next
                    // poll must use it even if nothing new arrived.
                    cursor = Cursor(resp.timestamp);
                    {
                        let mut state = self.state.lock().await;
                        state.cursor = Some(cursor);
                        state.polls += 1;
                    }

                    self.render_new(&resp.messages, resp.users.as_ref()).await?;
                }
                Err(e) if e.is_transient() => {
                    connected = false;
                    let delay = backoff.next_delay();
                    self.view
                        .set_status(ConnectionStatus::Reconnecting {
                            attempt: backoff.attempt(),
                        })
                        .await?;
                    warn!("poll failed: {e}; retrying in {delay:?}");
                    if !self.pause(&cancel, delay).await {
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!("dropping malformed poll response: {e}");
                    if !self.pause(&cancel, self.cfg.malformed_retry).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Fetch the server timestamp, retrying with backoff. Returns None if
    /// cancelled before a seed was obtained.
    async fn seed_cursor(&self, cancel: &CancellationToken) -> Result<Option<Cursor>> {
        let mut backoff = Backoff::new(self.cfg.retry_base, self.cfg.retry_max);
        loop {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                r = self.api.server_timestamp() => r,
            };

            match fetched {
                Ok(ts) => {
                    if backoff.attempt() > 0 {
                        self.view.set_status(ConnectionStatus::Live).await?;
                    }
                    let cursor = Cursor(ts);
                    self.state.lock().await.cursor = Some(cursor);
                    return Ok(Some(cursor));
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    self.view
                        .set_status(ConnectionStatus::Reconnecting {
                            attempt: backoff.attempt(),
                        })
                        .await?;
                    warn!("timestamp fetch failed: {e}; retrying in {delay:?}");
                    if !self.pause(cancel, delay).await {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Cancellable sleep; false means the session was cancelled.
    async fn pause(&self, cancel: &CancellationToken, delay: Duration) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }

    /// Append messages not seen before, in response order, then scroll.
    async fn render_new(
        &self,
        messages: &[WireMessage],
        users: Option<&HashMap<String, WireUser>>,
    ) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let fresh: Vec<WireMessage> = {
            let mut state = self.state.lock().await;
            messages
                .iter()
                .filter(|m| state.seen.insert(message_key(m)))
                .cloned()
                .collect()
        };
        if fresh.is_empty() {
            return Ok(());
        }

        let bubbles = bubbles_from(&fresh, users, self.cfg.resolve_user_metadata);
        self.view.append(&bubbles).await?;
        self.view.scroll_to_latest().await?;

        self.state.lock().await.rendered += fresh.len() as u64;
        Ok(())
    }
}

/// The server's boundary comparison is inclusive, so the message dated
/// exactly at the cursor is re-delivered by the next poll. There is no
/// server-assigned message id on the wire, so the key is the full content
/// triple.
fn message_key(m: &WireMessage) -> String {
    format!("{}\u{1f}{}\u{1f}{}", m.user_id, m.date, m.message)
}

/// Bounded FIFO set of message keys. Capacity 0 disables suppression.
#[derive(Debug, Default)]
struct SeenWindow {
    capacity: usize,
    order: VecDeque<String>,
    keys: HashSet<String>,
}

impl SeenWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            keys: HashSet::new(),
        }
    }

    /// True if the key was not in the window (the message is fresh).
    fn insert(&mut self, key: String) -> bool {
        if self.capacity == 0 {
            return true;
        }
        if self.keys.contains(&key) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.keys.remove(&evicted);
            }
        }
        self.order.push_back(key.clone());
        self.keys.insert(key);
        true
    }
}
