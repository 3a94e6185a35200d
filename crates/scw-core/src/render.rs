//! Message rendering model: turning wire messages into thread bubbles.
//!
//! The actual surface (terminal, web view) sits behind [`RenderSink`]; this
//! module owns the pure parts: sender resolution, role selection and the
//! local-time date header.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Timelike};

use crate::{
    api::types::{WireMessage, WireUser},
    Result,
};

/// Who sent a message, as far as the thread view cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Operator,
}

/// Render-ready form of one message: a header (display name + formatted
/// date) and a body, styled by role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub display_name: String,
    pub timestamp: String,
    pub body: String,
}

/// Connection state the view may surface without blocking the thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Live,
    Reconnecting { attempt: u32 },
}

/// Port for the scrolling thread view.
///
/// Appending is append-only and order-preserving; the sink never reorders
/// or drops bubbles. `scroll_to_latest` is only called after at least one
/// bubble was appended.
#[async_trait]
pub trait RenderSink: Send + Sync {
    async fn append(&self, bubbles: &[Bubble]) -> Result<()>;
    async fn scroll_to_latest(&self) -> Result<()>;
    async fn set_status(&self, status: ConnectionStatus) -> Result<()>;
}

/// Resolve messages into bubbles, in response order.
///
/// With metadata resolution on and a `users` map present, `user_id` maps to
/// a display name and the operator flag picks the role. An id missing from
/// the map degrades to the raw id with the user role, as does running with
/// resolution off or against a deployment that sends no map.
pub fn bubbles_from(
    messages: &[WireMessage],
    users: Option<&HashMap<String, WireUser>>,
    resolve_user_metadata: bool,
) -> Vec<Bubble> {
    messages
        .iter()
        .map(|m| {
            let meta = if resolve_user_metadata {
                users.and_then(|map| map.get(&m.user_id))
            } else {
                None
            };

            let (display_name, role) = match meta {
                Some(u) if u.is_operator => (u.telegram_username.clone(), Role::Operator),
                Some(u) => (u.telegram_username.clone(), Role::User),
                None => (m.user_id.clone(), Role::User),
            };

            let timestamp = match m.date_seconds() {
                Some(secs) => format_timestamp(secs),
                None => m.date.clone(),
            };

            Bubble {
                role,
                display_name,
                timestamp,
                body: m.message.clone(),
            }
        })
        .collect()
}

/// Format a seconds-since-epoch date for the header, in the viewer's local
/// time: unpadded `H:M:S, ` then weekday/month/day/year.
pub fn format_timestamp(seconds: f64) -> String {
    let millis = (seconds * 1000.0) as i64;
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => stamp(&dt),
        None => seconds.to_string(),
    }
}

fn stamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "{}:{}:{}, {}",
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.format("%a %b %d %Y")
    )
}
