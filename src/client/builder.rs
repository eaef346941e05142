use super::{ClientState, ConnectionStatus, NotificationClient};
use crate::infrastructure::{
    HeartbeatState, ReconnectPolicy, RuntimeSignals, origin_to_ws_endpoint, parse_ws_endpoint,
};
use crate::store::NotificationStore;
use crate::types::{
    DEFAULT_BASE_DELAY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_EVENT_BUFFER,
    DEFAULT_HEALTH_CHECK_TIMEOUT, DEFAULT_IO_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, DEFAULT_PING_FREQUENCY, ENV_PREFIX, RealtimeError,
    Result,
};
use crate::websocket::{Connector, WebSocketConnector};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use url::Url;

/// Tunables for the realtime channel. All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// First reconnect delay before jitter
    pub base_delay_ms: u64,
    /// Ceiling for any reconnect delay
    pub max_delay_ms: u64,
    /// Attempt count at which retries settle at `max_delay_ms`
    pub max_attempts: u32,
    /// Idle time before a heartbeat ping
    pub ping_frequency_ms: u64,
    /// How long a ping may go unanswered
    pub health_check_timeout_ms: u64,
    /// Bound on a connect attempt; a stalled handshake counts as a failure
    pub connect_timeout_ms: u64,
    /// Bound on a single frame write and on the close handshake
    pub io_timeout_ms: u64,
    /// Capacity of the notification broadcast to UI subscribers
    pub event_buffer: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY,
            max_delay_ms: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ping_frequency_ms: DEFAULT_PING_FREQUENCY,
            health_check_timeout_ms: DEFAULT_HEALTH_CHECK_TIMEOUT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT,
            io_timeout_ms: DEFAULT_IO_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ClientOptions {
    /// Loads options from `NOTIFY_*` environment variables, e.g.
    /// `NOTIFY_PING_FREQUENCY_MS=15000`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env) over an explicit variable set
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let options: Self = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(RealtimeError::Config("base_delay_ms must be positive".to_string()));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(RealtimeError::Config(format!(
                "max_delay_ms ({}) must be at least base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        if self.max_attempts == 0 {
            return Err(RealtimeError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.ping_frequency_ms == 0 || self.health_check_timeout_ms == 0 {
            return Err(RealtimeError::Config(
                "heartbeat intervals must be positive".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.io_timeout_ms == 0 {
            return Err(RealtimeError::Config("transport timeouts must be positive".to_string()));
        }
        if self.event_buffer == 0 {
            return Err(RealtimeError::Config("event_buffer must be positive".to_string()));
        }
        Ok(())
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.max_attempts,
        )
    }

    pub fn heartbeat(&self) -> HeartbeatState {
        HeartbeatState::new(
            Duration::from_millis(self.ping_frequency_ms),
            Duration::from_millis(self.health_check_timeout_ms),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Builder for NotificationClient that handles validation and wiring
pub struct NotificationClientBuilder {
    endpoint: Url,
    options: ClientOptions,
    connector: Option<Arc<dyn Connector>>,
    signals: Option<RuntimeSignals>,
}

impl NotificationClientBuilder {
    /// Create a builder for an explicit `ws://` or `wss://` endpoint
    pub fn new(endpoint: impl AsRef<str>, options: ClientOptions) -> Result<Self> {
        let endpoint = parse_ws_endpoint(endpoint.as_ref())?;
        options.validate()?;

        Ok(Self {
            endpoint,
            options,
            connector: None,
            signals: None,
        })
    }

    /// Create a builder for the endpoint served next to a page origin
    pub fn for_origin(origin: impl AsRef<str>, options: ClientOptions) -> Result<Self> {
        let endpoint = origin_to_ws_endpoint(origin.as_ref())?;
        options.validate()?;

        Ok(Self {
            endpoint,
            options,
            connector: None,
            signals: None,
        })
    }

    /// Replace the WebSocket connector
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Share runtime signals owned by the host application
    pub fn signals(mut self, signals: RuntimeSignals) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Build the client. Nothing is spawned until `start()`.
    pub fn build(self) -> NotificationClient {
        let (events, _) = broadcast::channel(self.options.event_buffer);
        let (status, _) = watch::channel(ConnectionStatus::default());

        NotificationClient {
            endpoint: self.endpoint,
            options: self.options,
            connector: self
                .connector
                .unwrap_or_else(|| Arc::new(WebSocketConnector)),
            signals: self.signals.unwrap_or_default(),
            store: Arc::new(RwLock::new(NotificationStore::new())),
            events,
            status: Arc::new(status),
            state: Arc::new(Mutex::new(ClientState::new())),
        }
    }
}
