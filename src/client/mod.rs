// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{ClientOptions, NotificationClientBuilder};
pub use connection::{ConnectionState, ConnectionStatus};
pub use self::core::NotificationClient;
pub use state::ClientState;
