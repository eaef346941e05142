use thiserror::Error;

/// Errors that can occur when using the realtime notification client.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint or origin)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out (e.g., close handshake not acknowledged)
    #[error("Timeout error")]
    Timeout,

    /// Attempted operation while the channel is not open
    #[error("Not connected")]
    NotConnected,
}

impl From<envy::Error> for RealtimeError {
    fn from(err: envy::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;
