use crate::types::{
    DocumentUploaded, InboundMessage, NotificationPayload, OrderStatusChange,
    UnshippedItemsAuthorized,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a notification, drives toast styling and the audio cue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    /// Audio cue category played for this kind
    pub fn audio_cue(self) -> AudioCue {
        match self {
            Self::Success | Self::Info => AudioCue::Success,
            Self::Warning => AudioCue::Warning,
            Self::Error => AudioCue::Error,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audio cue categories; tone synthesis is up to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Success,
    Warning,
    Error,
}

/// A notification shown to the operator for the lifetime of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}

impl NotificationEvent {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
            read: false,
            order_id: None,
            order_number: None,
        }
    }

    pub fn with_order(mut self, order_id: Option<String>, order_number: Option<String>) -> Self {
        self.order_id = order_id;
        self.order_number = order_number;
        self
    }

    /// Builds the event for an inbound frame. `None` for frames that carry
    /// no business event (heartbeat replies, unknown types).
    pub fn from_inbound(message: InboundMessage) -> Option<Self> {
        match message {
            InboundMessage::Notification(payload) => Some(Self::from(payload)),
            InboundMessage::DocumentUploaded(doc) => Some(Self::from(doc)),
            InboundMessage::UnshippedItemsAuthorized(auth) => Some(Self::from(auth)),
            InboundMessage::OrderStatusChange(change) => Some(Self::from(change)),
            InboundMessage::Pong | InboundMessage::Unknown => None,
        }
    }
}

impl From<NotificationPayload> for NotificationEvent {
    fn from(payload: NotificationPayload) -> Self {
        let mut event = Self::new(payload.title, payload.message, payload.kind)
            .with_order(payload.order_id, payload.order_number);
        if let Some(id) = payload.id {
            event.id = id;
        }
        if let Some(created_at) = payload.created_at {
            event.created_at = created_at;
        }
        event
    }
}

impl From<DocumentUploaded> for NotificationEvent {
    fn from(doc: DocumentUploaded) -> Self {
        let file = doc.file_name.as_deref().unwrap_or("A document");
        let message = match doc.order_number.as_deref() {
            Some(order) => format!("{} was uploaded to order {}", file, order),
            None => format!("{} was uploaded", file),
        };
        Self::new("Document uploaded", message, NotificationKind::Info)
            .with_order(doc.order_id, doc.order_number)
    }
}

impl From<UnshippedItemsAuthorized> for NotificationEvent {
    fn from(auth: UnshippedItemsAuthorized) -> Self {
        let items = match auth.item_count {
            Some(1) => "1 unshipped item".to_string(),
            Some(n) => format!("{} unshipped items", n),
            None => "Unshipped items".to_string(),
        };
        let mut message = match auth.order_number.as_deref() {
            Some(order) => format!("{} authorized on order {}", items, order),
            None => format!("{} authorized", items),
        };
        if let Some(by) = auth.authorized_by.as_deref() {
            message.push_str(&format!(" by {}", by));
        }
        Self::new("Unshipped items authorized", message, NotificationKind::Warning)
            .with_order(auth.order_id, auth.order_number)
    }
}

impl From<OrderStatusChange> for NotificationEvent {
    fn from(change: OrderStatusChange) -> Self {
        let message = match change.previous_status.as_deref() {
            Some(previous) => format!(
                "Order {} moved from {} to {}",
                change.order_number, previous, change.new_status
            ),
            None => format!("Order {} is now {}", change.order_number, change.new_status),
        };
        Self::new(
            "Order status changed",
            message,
            order_status_kind(&change.new_status),
        )
        .with_order(Some(change.order_id), Some(change.order_number))
    }
}

/// Static status -> kind table for order transitions
const ORDER_STATUS_KINDS: &[(&str, NotificationKind)] = &[
    ("shipped", NotificationKind::Success),
    ("delivered", NotificationKind::Success),
    ("completed", NotificationKind::Success),
    ("ready", NotificationKind::Success),
    ("on_hold", NotificationKind::Warning),
    ("backordered", NotificationKind::Warning),
    ("partially_shipped", NotificationKind::Warning),
    ("cancelled", NotificationKind::Error),
    ("canceled", NotificationKind::Error),
    ("rejected", NotificationKind::Error),
    ("failed", NotificationKind::Error),
];

/// Kind for an order's new status. Case-insensitive; `-` and spaces match `_`.
pub fn order_status_kind(status: &str) -> NotificationKind {
    let normalized: String = status
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    ORDER_STATUS_KINDS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, kind)| *kind)
        .unwrap_or(NotificationKind::Info)
}
