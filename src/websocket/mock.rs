//! In-memory connector for state machine tests.

use super::{Connector, FrameSink, FrameStream, Transport};
use crate::types::{RealtimeError, Result};
use futures::channel::mpsc;
use futures::future::{self, BoxFuture};
use futures::{FutureExt, SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Server side of one accepted in-memory connection
pub(crate) struct MockServer {
    /// Frames the client wrote
    pub(crate) received: mpsc::UnboundedReceiver<Message>,
    /// Frames to deliver to the client; dropping it closes the connection
    pub(crate) outgoing: mpsc::UnboundedSender<Result<Message>>,
}

impl MockServer {
    pub(crate) fn push_text(&self, text: &str) {
        let _ = self
            .outgoing
            .unbounded_send(Ok(Message::text(text.to_string())));
    }

    /// Next text frame written by the client, parsed as JSON
    pub(crate) async fn next_json(&mut self) -> Option<serde_json::Value> {
        while let Some(frame) = self.received.next().await {
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).ok();
            }
        }
        None
    }
}

/// One connect call observed by the connector
pub(crate) struct MockAttempt {
    pub(crate) at: Instant,
    pub(crate) server: Option<MockServer>,
}

pub(crate) struct MockConnector {
    refuse: AtomicBool,
    stall: AtomicBool,
    attempts: AtomicUsize,
    attempts_tx: tokio::sync::mpsc::UnboundedSender<MockAttempt>,
}

impl MockConnector {
    pub(crate) fn new() -> (Arc<Self>, tokio::sync::mpsc::UnboundedReceiver<MockAttempt>) {
        let (attempts_tx, attempts_rx) = tokio::sync::mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            refuse: AtomicBool::new(false),
            stall: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
            attempts_tx,
        });
        (connector, attempts_rx)
    }

    pub(crate) fn set_refusing(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Accept connects but never finish the handshake
    pub(crate) fn set_stalling(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    fn connect(&self, _endpoint: &Url) -> BoxFuture<'static, Result<Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let at = Instant::now();

        if self.stall.load(Ordering::SeqCst) {
            let _ = self.attempts_tx.send(MockAttempt { at, server: None });
            return future::pending().boxed();
        }

        if self.refuse.load(Ordering::SeqCst) {
            let _ = self.attempts_tx.send(MockAttempt { at, server: None });
            return future::err(RealtimeError::Connection("connection refused".to_string())).boxed();
        }

        let (client_tx, server_rx) = mpsc::unbounded::<Message>();
        let (server_tx, client_rx) = mpsc::unbounded::<Result<Message>>();

        let _ = self.attempts_tx.send(MockAttempt {
            at,
            server: Some(MockServer {
                received: server_rx,
                outgoing: server_tx,
            }),
        });

        let sink: FrameSink = Box::pin(
            client_tx.sink_map_err(|e| RealtimeError::Connection(format!("mock sink: {}", e))),
        );
        let stream: FrameStream = Box::pin(client_rx);
        future::ok(Transport::new(sink, stream)).boxed()
    }
}
