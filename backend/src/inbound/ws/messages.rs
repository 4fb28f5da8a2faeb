//! Wire-level frame definitions for the change notification feed.
//!
//! Clients send [`ClientFrame`]s as JSON text frames; the session answers
//! with [`ServerFrame`]s. Ride events cross the wire thin: identifiers and
//! the new status only, never joined data. Consumers refetch through the
//! REST surface after any event.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::RideEvent;

/// Inbound frames a client may send after the upgrade.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Present a bearer token; must precede any subscription.
    #[serde(rename_all = "camelCase")]
    Authenticate { token: String },
    /// Start receiving events for the listed topics.
    #[serde(rename_all = "camelCase")]
    Subscribe { topics: Vec<String> },
    /// Stop receiving events for the listed topics.
    #[serde(rename_all = "camelCase")]
    Unsubscribe { topics: Vec<String> },
}

/// Outbound frames the session emits.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// The presented token was accepted.
    #[serde(rename_all = "camelCase")]
    Authenticated { user_id: Uuid },
    /// The session's full topic list after a subscribe or unsubscribe.
    #[serde(rename_all = "camelCase")]
    Subscribed { topics: Vec<String> },
    /// A ride change matching one of the session's topics.
    #[serde(rename_all = "camelCase")]
    Event { topic: String, event: RideEvent },
    /// The session fell behind and events were dropped; the client must
    /// refetch the current state of anything it is watching.
    #[serde(rename_all = "camelCase")]
    Resync { skipped: u64 },
    /// A frame was understood but could not be honoured.
    #[serde(rename_all = "camelCase")]
    Error { code: String, message: String },
}

impl ServerFrame {
    /// An error frame with a stable machine-readable code.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_owned(),
            message: message.into(),
        }
    }
}
