use super::connection::Command;
use crate::infrastructure::TaskManager;
use tokio::sync::mpsc;

/// One start/stop cycle: the manager and dispatcher tasks plus the command
/// channel into the manager.
pub(crate) struct Session {
    pub(crate) commands: mpsc::UnboundedSender<Command>,
    pub(crate) tasks: TaskManager,
}

impl Session {
    /// The manager has exited (stopped or crashed)
    pub(crate) fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Mutable state for NotificationClient
pub struct ClientState {
    pub(crate) session: Option<Session>,
}

impl ClientState {
    pub fn new() -> Self {
        Self { session: None }
    }

    /// A session exists and its manager is still accepting commands
    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_closed())
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}
