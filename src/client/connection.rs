use super::builder::ClientOptions;
use crate::infrastructure::{HeartbeatState, ReconnectPolicy, SignalListeners, TaskManager, Timers};
use crate::types::{OutboundMessage, RealtimeError, Result};
use crate::websocket::{Connector, FrameSink, Transport};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until, timeout};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Deadline used for disarmed timer branches; never polled.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Readiness of the realtime channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot published by the connection manager after every event it handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub attempt_count: u32,
    /// Armed reconnect / idle / health-check deadlines
    pub pending_timers: usize,
    /// A retry came due while offline and waits for the network
    pub awaiting_network: bool,
}

/// Requests from the client handle
pub(crate) enum Command {
    Start,
    Send {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop,
}

/// Reports from connect and reader tasks, tagged with the connection
/// generation they belong to.
enum TransportEvent {
    Opened { generation: u64, transport: Transport },
    Failed { generation: u64, error: RealtimeError },
    Frame { generation: u64, frame: Message },
    Closed { generation: u64, reason: String },
}

impl TransportEvent {
    fn generation(&self) -> u64 {
        match self {
            Self::Opened { generation, .. }
            | Self::Failed { generation, .. }
            | Self::Frame { generation, .. }
            | Self::Closed { generation, .. } => *generation,
        }
    }
}

/// Owns the single logical connection: state, reconnect policy, heartbeat,
/// timer deadlines and the transport writer.
///
/// Runs as one task; every mutation happens inside [`run`](Self::run), so
/// there is no locking. Connect attempts and the frame reader are helper
/// tasks whose reports carry a generation number; reports from a superseded
/// connection are discarded.
pub(crate) struct ConnectionManager {
    endpoint: Url,
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    io_timeout: Duration,

    state: ConnectionState,
    policy: ReconnectPolicy,
    heartbeat: HeartbeatState,
    timers: Timers,
    awaiting_network: bool,

    generation: u64,
    writer: Option<FrameSink>,
    tasks: TaskManager,

    commands: mpsc::UnboundedReceiver<Command>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    listeners: SignalListeners,
    online_active: bool,
    visible_active: bool,
    frames: mpsc::UnboundedSender<String>,
    status: Arc<watch::Sender<ConnectionStatus>>,
}

impl ConnectionManager {
    pub(crate) fn new(
        endpoint: Url,
        connector: Arc<dyn Connector>,
        options: &ClientOptions,
        commands: mpsc::UnboundedReceiver<Command>,
        frames: mpsc::UnboundedSender<String>,
        listeners: SignalListeners,
        status: Arc<watch::Sender<ConnectionStatus>>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        Self {
            endpoint,
            connector,
            connect_timeout: options.connect_timeout(),
            io_timeout: options.io_timeout(),
            state: ConnectionState::Disconnected,
            policy: options.reconnect_policy(),
            heartbeat: options.heartbeat(),
            timers: Timers::default(),
            awaiting_network: false,
            generation: 0,
            writer: None,
            tasks: TaskManager::new(),
            commands,
            transport_tx,
            transport_rx,
            listeners,
            online_active: true,
            visible_active: true,
            frames,
            status,
        }
    }

    /// Event loop. Returns after a stop command or when the client handle is gone.
    pub(crate) async fn run(mut self) {
        tracing::debug!("Connection manager started for {}", self.endpoint);
        self.start();
        self.publish();

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Start) => self.start(),
                    Some(Command::Send { text, reply }) => {
                        let result = self.send_text(text).await;
                        let _ = reply.send(result);
                    }
                    Some(Command::Stop) | None => break,
                },

                Some(event) = self.transport_rx.recv() => self.on_transport_event(event).await,

                changed = self.listeners.online.changed(), if self.online_active => match changed {
                    Ok(()) => {
                        let online = *self.listeners.online.borrow_and_update();
                        self.on_online_changed(online);
                    }
                    Err(_) => self.online_active = false,
                },

                changed = self.listeners.visible.changed(), if self.visible_active => match changed {
                    Ok(()) => {
                        let visible = *self.listeners.visible.borrow_and_update();
                        self.on_visibility_changed(visible);
                    }
                    Err(_) => self.visible_active = false,
                },

                _ = sleep_until(deadline(self.timers.health_check)), if self.timers.health_check.is_some() => {
                    self.on_health_check_timeout();
                }

                _ = sleep_until(deadline(self.timers.idle)), if self.timers.idle.is_some() => {
                    self.on_idle().await;
                }

                _ = sleep_until(deadline(self.timers.reconnect)), if self.timers.reconnect.is_some() => {
                    self.on_reconnect_due();
                }
            }

            self.publish();
        }

        self.shutdown().await;
    }

    /// Opens a new connection unless one is already connecting or open
    fn start(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            tracing::debug!("Already {}, ignoring start", self.state);
            return;
        }

        self.release_transport();
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        self.awaiting_network = false;

        let generation = self.generation;
        let connect = self.connector.connect(&self.endpoint);
        let connect_timeout = self.connect_timeout;
        let events = self.transport_tx.clone();

        tracing::debug!(
            "Connecting to {} (generation {}, attempt {})",
            self.endpoint,
            generation,
            self.policy.attempts()
        );

        self.tasks.spawn(async move {
            // A handshake that never completes would pin the state at Connecting
            let event = match timeout(connect_timeout, connect).await {
                Ok(Ok(transport)) => TransportEvent::Opened {
                    generation,
                    transport,
                },
                Ok(Err(error)) => TransportEvent::Failed { generation, error },
                Err(_) => TransportEvent::Failed {
                    generation,
                    error: RealtimeError::Timeout,
                },
            };
            let _ = events.send(event);
        });
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        if event.generation() != self.generation {
            tracing::debug!(
                "Discarding event from superseded connection (generation {})",
                event.generation()
            );
            return;
        }

        match event {
            TransportEvent::Opened { transport, .. } => self.on_open(transport),
            TransportEvent::Failed { error, .. } => {
                tracing::debug!("Connection attempt failed: {}", error);
                self.on_transport_lost();
            }
            TransportEvent::Frame { frame, .. } => self.on_frame(frame),
            TransportEvent::Closed { reason, .. } => {
                tracing::debug!("Connection closed: {}", reason);
                self.on_transport_lost();
            }
        }
    }

    fn on_open(&mut self, transport: Transport) {
        if self.state != ConnectionState::Connecting {
            return;
        }

        let Transport { sink, mut stream } = transport;
        self.writer = Some(sink);

        let generation = self.generation;
        let events = self.transport_tx.clone();
        self.tasks.spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Close(close_frame)) => {
                        let reason = match close_frame {
                            Some(close_frame) => format!(
                                "server closed connection: code={:?}, reason='{}'",
                                close_frame.code,
                                close_frame.reason.as_str()
                            ),
                            None => "server closed connection without close frame".to_string(),
                        };
                        let _ = events.send(TransportEvent::Closed { generation, reason });
                        return;
                    }
                    Ok(frame) => {
                        if events
                            .send(TransportEvent::Frame { generation, frame })
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = events.send(TransportEvent::Closed {
                            generation,
                            reason: format!("read error: {}", e),
                        });
                        return;
                    }
                }
            }
            let _ = events.send(TransportEvent::Closed {
                generation,
                reason: "stream ended".to_string(),
            });
        });

        // Recovery is silent: no user-visible signal, only the status snapshot.
        self.state = ConnectionState::Open;
        self.policy.reset();
        self.awaiting_network = false;
        self.timers.reconnect = None;
        self.timers.health_check = None;
        self.timers.idle = Some(self.heartbeat.reset(Instant::now()));
        tracing::debug!("Realtime channel open (generation {})", generation);
    }

    fn on_frame(&mut self, frame: Message) {
        if self.state != ConnectionState::Open {
            return;
        }

        if self.heartbeat.is_pending() {
            tracing::debug!("Health check satisfied");
        }
        self.timers.health_check = None;
        self.timers.idle = Some(self.heartbeat.record_message(Instant::now()));

        match frame {
            Message::Text(text) => {
                if self.frames.send(text.as_str().to_owned()).is_err() {
                    tracing::warn!("Dispatcher gone, dropping inbound frame");
                }
            }
            Message::Binary(data) => {
                tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
            }
            Message::Ping(data) => tracing::debug!("Received ping ({} bytes)", data.len()),
            Message::Pong(data) => tracing::debug!("Received pong ({} bytes)", data.len()),
            Message::Close(_) | Message::Frame(_) => {}
        }
    }

    /// Transport dropped or a connect attempt failed: back off and retry
    fn on_transport_lost(&mut self) {
        if !matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            return;
        }

        self.release_transport();
        self.state = ConnectionState::Disconnected;

        let delay = self.policy.next_delay();
        self.timers.reconnect = Some(Instant::now() + delay);
        tracing::debug!(
            "Reconnecting in {:?} (attempt {}{})",
            delay,
            self.policy.attempts(),
            if self.policy.is_saturated() {
                ", at max delay"
            } else {
                ""
            }
        );
    }

    fn on_reconnect_due(&mut self) {
        self.timers.reconnect = None;

        if self.state != ConnectionState::Disconnected {
            return;
        }

        if !*self.listeners.online.borrow() {
            tracing::debug!("Network offline, deferring reconnect until it returns");
            self.awaiting_network = true;
            return;
        }

        self.policy.record_attempt();
        self.start();
    }

    fn on_online_changed(&mut self, online: bool) {
        if !online {
            tracing::debug!("Network went offline");
            return;
        }

        if self.state == ConnectionState::Disconnected {
            tracing::debug!("Network back online, reconnecting now");
            self.policy.reset();
            self.start();
        }
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        if !visible || self.state != ConnectionState::Disconnected {
            return;
        }

        if !*self.listeners.online.borrow() {
            return;
        }

        tracing::debug!("Console visible again, reconnecting now");
        self.policy.reset();
        self.start();
    }

    async fn on_idle(&mut self) {
        self.timers.idle = None;

        if self.state != ConnectionState::Open || self.heartbeat.is_pending() {
            return;
        }

        let ping = match serde_json::to_string(&OutboundMessage::ping_now()) {
            Ok(ping) => ping,
            Err(e) => {
                tracing::error!("Failed to encode heartbeat: {}", e);
                return;
            }
        };

        match self.write(ping).await {
            Ok(()) => {
                self.timers.health_check = Some(self.heartbeat.probe_sent(Instant::now()));
                tracing::debug!("Sent heartbeat ping");
            }
            Err(e) => {
                tracing::warn!("Failed to send heartbeat: {}", e);
                self.on_transport_lost();
            }
        }
    }

    /// No frame arrived after a ping: the connection is dead even if the
    /// transport has not noticed. Drop it and reconnect without backoff.
    fn on_health_check_timeout(&mut self) {
        self.timers.health_check = None;

        if self.state != ConnectionState::Open {
            return;
        }

        tracing::warn!("Health check timed out, forcing reconnect");
        self.state = ConnectionState::Closing;
        self.release_transport();
        self.state = ConnectionState::Disconnected;
        self.policy.reset();
        self.start();
    }

    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.state != ConnectionState::Open {
            return Err(RealtimeError::NotConnected);
        }

        let result = self.write(text).await;
        if let Err(e) = &result {
            tracing::warn!("Failed to send message: {}", e);
            self.on_transport_lost();
        }
        result
    }

    async fn write(&mut self, text: String) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(RealtimeError::NotConnected);
        };

        match timeout(self.io_timeout, writer.send(Message::text(text))).await {
            Ok(result) => result,
            Err(_) => Err(RealtimeError::Timeout),
        }
    }

    /// Drops the writer and helper tasks of the current connection
    fn release_transport(&mut self) {
        self.writer = None;
        self.tasks.abort_all();
        self.heartbeat.clear();
        self.timers.clear_heartbeat();
    }

    async fn shutdown(mut self) {
        self.timers.clear();

        if let Some(mut writer) = self.writer.take() {
            self.state = ConnectionState::Closing;
            self.publish();
            match timeout(self.io_timeout, writer.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!("Close handshake failed: {}", e),
                Err(_) => tracing::debug!("Close handshake timed out"),
            }
        }

        self.release_transport();
        self.state = ConnectionState::Disconnected;
        self.awaiting_network = false;
        self.publish();
        tracing::debug!("Connection manager finished");
    }

    fn publish(&self) {
        let status = ConnectionStatus {
            state: self.state,
            attempt_count: self.policy.attempts(),
            pending_timers: self.timers.pending(),
            awaiting_network: self.awaiting_network,
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

fn deadline(at: Option<Instant>) -> Instant {
    at.unwrap_or_else(|| Instant::now() + FAR_FUTURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::RuntimeSignals;
    use crate::websocket::mock::{MockAttempt, MockConnector};

    struct Harness {
        manager: ConnectionManager,
        connector: Arc<MockConnector>,
        attempts: mpsc::UnboundedReceiver<MockAttempt>,
        frames: mpsc::UnboundedReceiver<String>,
        _commands: mpsc::UnboundedSender<Command>,
        _signals: RuntimeSignals,
    }

    fn harness() -> Harness {
        let (connector, attempts) = MockConnector::new();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ConnectionStatus::default());
        let signals = RuntimeSignals::new();

        let manager = ConnectionManager::new(
            Url::parse("ws://warehouse.test/ws").unwrap(),
            connector.clone(),
            &ClientOptions::default(),
            commands_rx,
            frames_tx,
            signals.listen(),
            Arc::new(status),
        );

        Harness {
            manager,
            connector,
            attempts,
            frames,
            _commands: commands_tx,
            _signals: signals,
        }
    }

    async fn apply_next_event(manager: &mut ConnectionManager) {
        let event = manager.transport_rx.recv().await.unwrap();
        manager.on_transport_event(event).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_from_replaced_connection_are_discarded() {
        let mut h = harness();

        h.manager.start();
        let _old_server = h.attempts.recv().await.unwrap().server.unwrap();
        apply_next_event(&mut h.manager).await;
        assert_eq!(h.manager.state, ConnectionState::Open);
        assert_eq!(h.manager.generation, 1);

        // Health check gives up on the first connection and opens a second
        h.manager.on_health_check_timeout();
        let _new_server = h.attempts.recv().await.unwrap().server.unwrap();
        apply_next_event(&mut h.manager).await;
        assert_eq!(h.manager.state, ConnectionState::Open);
        assert_eq!(h.manager.generation, 2);
        let idle = h.manager.timers.idle;

        let late = r#"{"type":"notification","title":"late","message":"m"}"#;
        h.manager
            .on_transport_event(TransportEvent::Frame {
                generation: 1,
                frame: Message::text(late.to_string()),
            })
            .await;
        h.manager
            .on_transport_event(TransportEvent::Closed {
                generation: 1,
                reason: "read error: connection reset".to_string(),
            })
            .await;

        assert_eq!(h.manager.state, ConnectionState::Open);
        assert_eq!(h.manager.timers.idle, idle);
        assert!(h.manager.timers.reconnect.is_none());
        assert!(h.manager.writer.is_some());
        assert!(h.frames.try_recv().is_err());
        assert_eq!(h.connector.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_due_while_connecting_is_a_no_op() {
        let mut h = harness();
        h.connector.set_stalling(true);

        h.manager.start();
        assert!(h.attempts.recv().await.unwrap().server.is_none());

        h.manager.timers.reconnect = Some(Instant::now());
        h.manager.on_reconnect_due();

        assert_eq!(h.manager.state, ConnectionState::Connecting);
        assert_eq!(h.manager.policy.attempts(), 0);
        assert_eq!(h.manager.generation, 1);
        assert!(h.manager.timers.reconnect.is_none());
        assert_eq!(h.connector.attempts(), 1);
    }
}
