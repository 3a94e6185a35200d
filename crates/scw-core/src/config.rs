use std::{
    env, fs,
    path::Path,
    time::Duration,
};

use crate::{
    domain::{TicketId, Token},
    errors::Error,
    Result,
};

/// Typed configuration for the chat client.
///
/// One configurable client replaces the deployment-specific script
/// variants: the ticket path segment and user-metadata resolution are
/// options, not separate builds.
#[derive(Clone, Debug)]
pub struct Config {
    // Server scope
    pub base_url: String,
    pub token: Token,
    pub ticket: Option<TicketId>,
    /// Include the ticket segment in request paths. Defaults to whether a
    /// ticket is configured at all.
    pub include_ticket_in_path: bool,
    /// Resolve `user_id` through the poll response's `users` map.
    pub resolve_user_metadata: bool,

    // Polling
    /// Long-poll hold bound sent to the server as `wait_for`.
    pub poll_wait: Duration,
    /// Timeout for unary requests. The poll request gets `poll_wait` plus
    /// [`Config::POLL_TIMEOUT_GRACE`] instead.
    pub request_timeout: Duration,

    // Failure handling
    pub retry_base: Duration,
    pub retry_max: Duration,
    pub malformed_retry: Duration,

    // Rendering
    /// Seen-message window for duplicate suppression; 0 disables it.
    pub dedupe_window: usize,
    /// Fetch and render the conversation backlog before polling starts.
    pub fetch_history: bool,
    pub use_color: bool,
}

impl Config {
    /// Slack added on top of `poll_wait` for the poll request timeout, so a
    /// server that holds the connection for the full bound still answers
    /// inside it.
    pub const POLL_TIMEOUT_GRACE: Duration = Duration::from_secs(10);

    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let base_url = env_str("SCW_BASE_URL")
            .and_then(non_empty)
            .map(|s| s.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                Error::Config("SCW_BASE_URL environment variable is required".to_string())
            })?;

        let token = env_str("SCW_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("SCW_TOKEN environment variable is required".to_string())
        })?;

        let ticket = env_str("SCW_TICKET").and_then(non_empty).map(TicketId);

        let include_ticket_in_path =
            env_bool("SCW_TICKET_IN_PATH").unwrap_or(ticket.is_some());
        if include_ticket_in_path && ticket.is_none() {
            return Err(Error::Config(
                "SCW_TICKET_IN_PATH is set but no SCW_TICKET is configured".to_string(),
            ));
        }

        let resolve_user_metadata = env_bool("SCW_RESOLVE_USERS").unwrap_or(true);

        let poll_wait = Duration::from_secs(env_u64("SCW_POLL_WAIT_SECS").unwrap_or(20));
        let request_timeout =
            Duration::from_millis(env_u64("SCW_REQUEST_TIMEOUT_MS").unwrap_or(10_000));

        let retry_base = Duration::from_millis(env_u64("SCW_RETRY_BASE_MS").unwrap_or(500));
        let retry_max = Duration::from_millis(env_u64("SCW_RETRY_MAX_MS").unwrap_or(30_000));
        let malformed_retry =
            Duration::from_millis(env_u64("SCW_MALFORMED_RETRY_MS").unwrap_or(1_000));

        let dedupe_window = env_usize("SCW_DEDUPE_WINDOW").unwrap_or(256);
        let fetch_history = env_bool("SCW_FETCH_HISTORY").unwrap_or(true);

        // NO_COLOR is the conventional opt-out; SCW_NO_COLOR also works.
        let no_color = env_bool("SCW_NO_COLOR").unwrap_or(false)
            || env::var_os("NO_COLOR").is_some();

        Ok(Self {
            base_url,
            token: Token(token),
            ticket,
            include_ticket_in_path,
            resolve_user_metadata,
            poll_wait,
            request_timeout,
            retry_base,
            retry_max,
            malformed_retry,
            dedupe_window,
            fetch_history,
            use_color: !no_color,
        })
    }

    /// Timeout for the long-poll request itself.
    pub fn poll_timeout(&self) -> Duration {
        self.poll_wait + Self::POLL_TIMEOUT_GRACE
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
