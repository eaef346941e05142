use super::{AudioCue, NotificationEvent};
use crate::store::NotificationStore;
use crate::types::InboundMessage;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};

/// Characters of a raw frame included in log lines
const LOG_PREVIEW_CHARS: usize = 200;

/// What UI consumers receive for each business event: the toast content and
/// the audio cue to play.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedNotification {
    pub event: NotificationEvent,
    pub cue: AudioCue,
}

/// Routes inbound text frames to the notification store and UI subscribers
pub struct EventDispatcher {
    store: Arc<RwLock<NotificationStore>>,
    events: broadcast::Sender<DispatchedNotification>,
}

impl EventDispatcher {
    pub fn new(
        store: Arc<RwLock<NotificationStore>>,
        events: broadcast::Sender<DispatchedNotification>,
    ) -> Self {
        Self { store, events }
    }

    /// Consumes frames in arrival order until the sender side is dropped
    pub async fn run(self, mut frames: mpsc::UnboundedReceiver<String>) {
        tracing::debug!("Starting dispatch task");
        while let Some(text) = frames.recv().await {
            self.dispatch(&text).await;
        }
        tracing::debug!("Dispatch task finished");
    }

    /// Parses and routes a single frame.
    ///
    /// Malformed frames are logged and dropped. Returns the event that was
    /// produced, if any.
    pub async fn dispatch(&self, text: &str) -> Option<NotificationEvent> {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse message: {} - Raw ({} bytes): {}",
                    e,
                    text.len(),
                    preview(text)
                );
                return None;
            }
        };

        match &message {
            InboundMessage::Pong => {
                tracing::debug!("Received heartbeat reply");
                return None;
            }
            InboundMessage::Unknown => {
                tracing::debug!("Ignoring message with unknown type: {}", preview(text));
                return None;
            }
            _ => {}
        }

        let event = NotificationEvent::from_inbound(message)?;
        let cue = event.kind.audio_cue();

        self.store.write().await.append(event.clone());

        tracing::debug!(
            "Dispatched notification: id={}, kind={}, title={}",
            event.id,
            event.kind,
            event.title
        );

        if self
            .events
            .send(DispatchedNotification {
                event: event.clone(),
                cue,
            })
            .is_err()
        {
            tracing::debug!("No notification subscribers, event {} kept in store only", event.id);
        }

        Some(event)
    }
}

/// Leading slice of a frame, cut on a char boundary
fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::NotificationKind;

    fn dispatcher() -> (
        EventDispatcher,
        Arc<RwLock<NotificationStore>>,
        broadcast::Receiver<DispatchedNotification>,
    ) {
        let store = Arc::new(RwLock::new(NotificationStore::new()));
        let (tx, rx) = broadcast::channel(16);
        (EventDispatcher::new(Arc::clone(&store), tx), store, rx)
    }

    #[tokio::test]
    async fn test_order_cancelled_routes_error_cue() {
        let (dispatcher, store, mut rx) = dispatcher();

        let event = dispatcher
            .dispatch(
                r#"{"type":"orderStatusChange","orderId":"o-1","orderNumber":"SO-1","previousStatus":"packed","newStatus":"cancelled"}"#,
            )
            .await
            .unwrap();

        assert_eq!(event.kind, NotificationKind::Error);

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.cue, AudioCue::Error);
        assert_eq!(delivered.event, event);

        let store = store.read().await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_frames_are_dropped() {
        let (dispatcher, store, mut rx) = dispatcher();

        assert!(dispatcher.dispatch("{oops").await.is_none());
        assert!(dispatcher.dispatch(r#"{"type":"pong"}"#).await.is_none());
        assert!(dispatcher.dispatch(r#"{"type":"stockMoved"}"#).await.is_none());
        assert!(
            dispatcher
                .dispatch(r#"{"type":"orderStatusChange","orderNumber":"SO-1"}"#)
                .await
                .is_none()
        );

        assert!(store.read().await.is_empty());
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_run_preserves_arrival_order() {
        let (dispatcher, store, _rx) = dispatcher();
        let (tx, frames) = mpsc::unbounded_channel();

        for n in 1..=3 {
            tx.send(format!(
                r#"{{"type":"notification","title":"n{}","message":"m","kind":"success"}}"#,
                n
            ))
            .unwrap();
        }
        tx.send("garbage".to_string()).unwrap();
        drop(tx);

        dispatcher.run(frames).await;

        let store = store.read().await;
        let titles: Vec<_> = store.events().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["n3", "n2", "n1"]);
    }

    #[tokio::test]
    async fn test_dispatch_without_subscribers_still_stores() {
        let store = Arc::new(RwLock::new(NotificationStore::new()));
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        let dispatcher = EventDispatcher::new(Arc::clone(&store), tx);

        dispatcher
            .dispatch(r#"{"type":"documentUploaded","orderNumber":"SO-2","fileName":"bol.pdf"}"#)
            .await
            .unwrap();

        assert_eq!(store.read().await.len(), 1);
    }

    #[test]
    fn test_preview_truncates_large_frames() {
        let short = r#"{"type":"pong"}"#;
        assert_eq!(preview(short), short);

        let large = format!(r#"{{"type":"notification","title":"{}"#, "é".repeat(10_000));
        let cut = preview(&large);
        assert_eq!(cut.chars().count(), LOG_PREVIEW_CHARS);
        assert!(large.starts_with(cut));
    }
}
