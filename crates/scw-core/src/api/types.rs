use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A single chat message as the server returns it.
///
/// `date` is seconds since the epoch. The server serializes it as a float
/// in some responses and as a string in others, so both are accepted;
/// `user_id` gets the same treatment. Messages are immutable once received
/// and their order is the server's order.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WireMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub date: String,
    pub message: String,
}

impl WireMessage {
    /// `date` parsed to seconds, if the server sent something numeric.
    pub fn date_seconds(&self) -> Option<f64> {
        self.date.trim().parse::<f64>().ok()
    }
}

/// Per-sender metadata, keyed by `user_id` in [`PollResponse::users`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WireUser {
    pub telegram_username: String,
    #[serde(default)]
    pub is_operator: bool,
}

/// Body of a polling response.
///
/// `timestamp` and `messages` are required; a response missing either is a
/// protocol error and must not advance the cursor. `users` is absent on
/// deployments that do not expose sender metadata. The server may echo
/// `ticket_id` back; it carries no information the client needs.
#[derive(Clone, Debug, Deserialize)]
pub struct PollResponse {
    pub timestamp: f64,
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub users: Option<HashMap<String, WireUser>>,
}

/// Body of the initial timestamp fetch used to seed the cursor.
#[derive(Clone, Debug, Deserialize)]
pub struct TimestampResponse {
    pub timestamp: f64,
}

/// Conversation backlog returned by `get_messages`.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<WireMessage>,
}

fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;

    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    de.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_poll_response_with_users() {
        let body = r#"{
            "timestamp": 150.5,
            "messages": [{"user_id": "u1", "date": "120", "message": "hi"}],
            "users": {"u1": {"telegram_username": "alice", "is_operator": false}}
        }"#;
        let resp: PollResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.timestamp, 150.5);
        assert_eq!(resp.messages.len(), 1);
        assert_eq!(resp.messages[0].user_id, "u1");
        assert_eq!(resp.messages[0].message, "hi");
        let users = resp.users.unwrap();
        assert_eq!(users["u1"].telegram_username, "alice");
        assert!(!users["u1"].is_operator);
    }

    #[test]
    fn users_map_is_optional() {
        let body = r#"{"timestamp": 100, "messages": []}"#;
        let resp: PollResponse = serde_json::from_str(body).unwrap();
        assert!(resp.users.is_none());
        assert!(resp.messages.is_empty());
    }

    #[test]
    fn numeric_date_and_user_id_are_accepted() {
        let body = r#"{"user_id": 7, "date": 1700000000.25, "message": "x"}"#;
        let msg: WireMessage = serde_json::from_str(body).unwrap();
        assert_eq!(msg.user_id, "7");
        assert_eq!(msg.date, "1700000000.25");
        assert_eq!(msg.date_seconds(), Some(1700000000.25));
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let body = r#"{"messages": []}"#;
        assert!(serde_json::from_str::<PollResponse>(body).is_err());
    }

    #[test]
    fn missing_messages_is_rejected() {
        let body = r#"{"timestamp": 100}"#;
        assert!(serde_json::from_str::<PollResponse>(body).is_err());
    }

    #[test]
    fn operator_flag_defaults_to_false() {
        let u: WireUser = serde_json::from_str(r#"{"telegram_username": "bob"}"#).unwrap();
        assert!(!u.is_operator);
    }
}
