// Infrastructure module - Core background services and utilities
pub mod endpoint;
pub mod heartbeat;
pub mod signals;
pub mod task_manager;
pub mod timer;

pub use endpoint::{origin_to_ws_endpoint, parse_ws_endpoint};
pub use heartbeat::{HeartbeatState, Timers};
pub use signals::RuntimeSignals;
pub(crate) use signals::SignalListeners;
pub use task_manager::TaskManager;
pub use timer::ReconnectPolicy;
