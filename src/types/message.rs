use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::messaging::NotificationKind;
use crate::types::Result;

/// Frames the server pushes over the realtime channel, discriminated by `type`.
///
/// Unknown `type` values deserialize to [`InboundMessage::Unknown`] so newer
/// servers never break older clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Heartbeat reply. Only the tag is inspected.
    Pong,

    /// A fully formed notification
    Notification(NotificationPayload),

    /// A document was attached to an order
    DocumentUploaded(DocumentUploaded),

    /// Shipping of an order with missing items was authorized
    UnshippedItemsAuthorized(UnshippedItemsAuthorized),

    /// An order moved between workflow statuses
    OrderStatusChange(OrderStatusChange),

    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Parses a text frame
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_id")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub order_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploaded {
    #[serde(default, deserialize_with = "optional_id")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub order_number: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnshippedItemsAuthorized {
    #[serde(default, deserialize_with = "optional_id")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub order_number: Option<String>,
    #[serde(default)]
    pub item_count: Option<u32>,
    #[serde(default)]
    pub authorized_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChange {
    #[serde(deserialize_with = "required_id")]
    pub order_id: String,
    #[serde(deserialize_with = "required_id")]
    pub order_number: String,
    #[serde(default)]
    pub previous_status: Option<String>,
    pub new_status: String,
}

/// Frames the client sends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Heartbeat probe carrying the send time in epoch milliseconds
    Ping { timestamp: i64 },
}

impl OutboundMessage {
    pub fn ping_now() -> Self {
        Self::Ping {
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Order identifiers arrive as either JSON strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum Identifier {
    Text(String),
    Number(i64),
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        match id {
            Identifier::Text(s) => s,
            Identifier::Number(n) => n.to_string(),
        }
    }
}

fn required_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Identifier::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Identifier>::deserialize(deserializer)?.map(String::from))
}
