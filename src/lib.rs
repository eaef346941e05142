//! # Realtime Notify
//!
//! Resilient real-time notification channel for the warehouse operations
//! console: one persistent WebSocket to the server that recovers from drops
//! with jittered backoff, detects silent connections with heartbeats, and
//! turns server pushes (order status changes, document uploads, shipping
//! authorizations) into typed notifications for the UI.
//!
//! ## Example
//!
//! ```no_run
//! use realtime_notify::{ClientOptions, NotificationClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NotificationClient::for_origin(
//!         "https://ops.example.com",
//!         ClientOptions::default(),
//!     )?;
//!
//!     client.start().await;
//!     // ...
//!     client.stop().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod store;
pub mod types;
pub mod websocket;

pub use client::{
    ClientOptions, ConnectionState, ConnectionStatus, NotificationClient, NotificationClientBuilder,
};
pub use infrastructure::{ReconnectPolicy, RuntimeSignals};
pub use messaging::{AudioCue, DispatchedNotification, NotificationEvent, NotificationKind};
pub use store::NotificationStore;
pub use types::{InboundMessage, OutboundMessage, RealtimeError, Result};
pub use websocket::{Connector, Transport, WebSocketConnector};
