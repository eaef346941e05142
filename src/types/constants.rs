/// Path of the realtime endpoint relative to the page origin
pub const ENDPOINT_PATH: &str = "/ws";

/// Default base reconnect delay (milliseconds)
pub const DEFAULT_BASE_DELAY: u64 = 1000;

/// Default reconnect delay ceiling (milliseconds)
pub const DEFAULT_MAX_DELAY: u64 = 30000;

/// Attempt count at which the reconnect policy saturates
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Growth factor between consecutive reconnect delays
pub const BACKOFF_FACTOR: f64 = 1.5;

/// Jitter bounds applied to every computed reconnect delay
pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_MAX: f64 = 1.2;

/// Default idle time before a heartbeat ping is sent (milliseconds)
pub const DEFAULT_PING_FREQUENCY: u64 = 30000;

/// Default wait for any inbound frame after a ping (milliseconds)
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: u64 = 5000;

/// Bound on a connect attempt, handshake included (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10000;

/// Bound on a frame write or the close handshake (milliseconds)
pub const DEFAULT_IO_TIMEOUT: u64 = 2000;

/// Capacity of the UI notification broadcast
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Prefix of environment variables read by `ClientOptions::from_env`
pub const ENV_PREFIX: &str = "NOTIFY_";
