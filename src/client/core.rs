use super::connection::{Command, ConnectionManager};
use super::state::Session;
use super::{ClientOptions, ClientState, ConnectionState, ConnectionStatus, NotificationClientBuilder};
use crate::infrastructure::{RuntimeSignals, TaskManager};
use crate::messaging::{DispatchedNotification, EventDispatcher};
use crate::store::NotificationStore;
use crate::types::{RealtimeError, Result};
use crate::websocket::Connector;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast, mpsc, oneshot, watch};
use url::Url;

/// The entry point for the operations console's real-time notifications.
///
/// `NotificationClient` owns one logical channel to the server. It hides
/// reconnection churn from consumers: drops are retried with jittered
/// backoff, silent connections are detected with heartbeats, and network or
/// visibility changes trigger an immediate attempt. Business events arrive
/// through [`subscribe`](Self::subscribe) and are kept in the session
/// [`NotificationStore`].
///
/// # Example
///
/// ```no_run
/// use realtime_notify::{ClientOptions, NotificationClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = NotificationClient::for_origin("https://ops.example.com", ClientOptions::default())?;
///
/// let mut notifications = client.subscribe();
/// client.start().await;
///
/// while let Ok(dispatched) = notifications.recv().await {
///     println!("[{}] {}", dispatched.event.kind, dispatched.event.title);
/// }
///
/// client.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NotificationClient {
    pub(crate) endpoint: Url,
    pub(crate) options: ClientOptions,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) signals: RuntimeSignals,

    // Session-scoped notification list
    pub(crate) store: Arc<RwLock<NotificationStore>>,

    // UI fan-out (toasts, audio cues)
    pub(crate) events: broadcast::Sender<DispatchedNotification>,

    // Latest snapshot published by the connection manager
    pub(crate) status: Arc<watch::Sender<ConnectionStatus>>,

    pub(crate) state: Arc<Mutex<ClientState>>,
}

impl NotificationClient {
    /// Creates a client for an explicit `ws://` or `wss://` endpoint.
    ///
    /// Nothing connects until [`start()`](Self::start) is called.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`] or [`RealtimeError::Config`] if the
    /// endpoint is malformed or the options are invalid.
    pub fn new(endpoint: impl AsRef<str>, options: ClientOptions) -> Result<Self> {
        NotificationClientBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Creates a client for the `/ws` endpoint next to the page origin,
    /// choosing `wss` for `https` origins and `ws` otherwise.
    pub fn for_origin(origin: impl AsRef<str>, options: ClientOptions) -> Result<Self> {
        NotificationClientBuilder::for_origin(origin, options).map(|builder| builder.build())
    }

    /// Builder for clients that need a custom connector or shared signals
    pub fn builder(
        endpoint: impl AsRef<str>,
        options: ClientOptions,
    ) -> Result<NotificationClientBuilder> {
        NotificationClientBuilder::new(endpoint, options)
    }

    /// Starts the channel.
    ///
    /// Idempotent: if the channel is already connecting or open this is a
    /// no-op. Returns immediately; connection progress is visible through
    /// [`watch_status`](Self::watch_status).
    pub async fn start(&self) {
        let mut state = self.state.lock().await;

        if state.is_running()
            && let Some(session) = state.session.as_ref()
        {
            let _ = session.commands.send(Command::Start);
            return;
        }

        if let Some(mut stale) = state.session.take() {
            stale.tasks.abort_all();
        }

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();

        let manager = ConnectionManager::new(
            self.endpoint.clone(),
            Arc::clone(&self.connector),
            &self.options,
            commands_rx,
            frames_tx,
            self.signals.listen(),
            Arc::clone(&self.status),
        );
        let dispatcher = EventDispatcher::new(Arc::clone(&self.store), self.events.clone());

        let mut tasks = TaskManager::new();
        tasks.spawn(manager.run());
        tasks.spawn(dispatcher.run(frames_rx));

        state.session = Some(Session {
            commands: commands_tx,
            tasks,
        });

        tracing::info!("Starting realtime channel to {}", self.endpoint);
    }

    /// Stops the channel.
    ///
    /// Cancels every timer, detaches the network and visibility listeners and
    /// closes the connection. Frames already received are still dispatched
    /// before this returns. The client can be started again afterwards.
    pub async fn stop(&self) {
        let session = self.state.lock().await.session.take();
        let Some(mut session) = session else {
            return;
        };

        tracing::info!(
            "Stopping realtime channel ({} session tasks running)",
            session.tasks.running()
        );
        let _ = session.commands.send(Command::Stop);
        session.tasks.join_all().await;
        tracing::info!("Realtime channel stopped");
    }

    /// Sends a structured message.
    ///
    /// The message is transmitted only if the channel is open right now;
    /// there is no outbound queue.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::NotConnected`] if the channel is not open,
    /// [`RealtimeError::Serialization`] if the message cannot be encoded, or
    /// the transport error if the write fails.
    pub async fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<()> {
        let text = serde_json::to_string(message)?;

        let commands = {
            let state = self.state.lock().await;
            match state.session.as_ref() {
                Some(session) => session.commands.clone(),
                None => return Err(RealtimeError::NotConnected),
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        commands
            .send(Command::Send {
                text,
                reply: reply_tx,
            })
            .map_err(|_| RealtimeError::NotConnected)?;

        reply_rx.await.map_err(|_| RealtimeError::NotConnected)?
    }

    /// Latest connection snapshot
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Receives every business event as it is dispatched
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchedNotification> {
        self.events.subscribe()
    }

    /// Shared notification list
    pub fn notifications(&self) -> Arc<RwLock<NotificationStore>> {
        Arc::clone(&self.store)
    }

    pub async fn mark_read(&self, id: &str) -> bool {
        self.store.write().await.mark_read(id)
    }

    pub async fn mark_all_read(&self) {
        self.store.write().await.mark_all_read();
    }

    pub async fn clear_notifications(&self) {
        self.store.write().await.clear();
    }

    pub async fn unread_count(&self) -> usize {
        self.store.read().await.unread_count()
    }

    /// Network and visibility signals this client reacts to
    pub fn signals(&self) -> &RuntimeSignals {
        &self.signals
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}
