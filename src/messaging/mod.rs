// Messaging module - Event model and inbound frame routing
pub mod event;
pub mod router;

pub use event::{AudioCue, NotificationEvent, NotificationKind, order_status_kind};
pub use router::{DispatchedNotification, EventDispatcher};
