use std::sync::Arc;
use tokio::sync::watch;

/// Runtime conditions the channel reacts to: network reachability and
/// whether the console is currently visible to the operator.
///
/// The host application owns a `RuntimeSignals` and flips it from whatever
/// platform hooks it has. Every running connection manager holds one
/// listener per signal; [`listener_count`](Self::listener_count) exposes how
/// many are attached so teardown can be verified.
#[derive(Clone)]
pub struct RuntimeSignals {
    online: Arc<watch::Sender<bool>>,
    visible: Arc<watch::Sender<bool>>,
}

impl RuntimeSignals {
    /// Starts online and visible
    pub fn new() -> Self {
        let (online, _) = watch::channel(true);
        let (visible, _) = watch::channel(true);
        Self {
            online: Arc::new(online),
            visible: Arc::new(visible),
        }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Reports network reachability. Listeners are only woken on a change.
    pub fn set_online(&self, online: bool) {
        self.online.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }

    /// Reports page visibility. Listeners are only woken on a change.
    pub fn set_visible(&self, visible: bool) {
        self.visible.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
    }

    /// Total listeners attached across both signals
    pub fn listener_count(&self) -> usize {
        self.online.receiver_count() + self.visible.receiver_count()
    }

    pub(crate) fn listen(&self) -> SignalListeners {
        SignalListeners {
            online: self.online.subscribe(),
            visible: self.visible.subscribe(),
        }
    }
}

impl Default for RuntimeSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener pair owned by one connection manager; dropping it detaches both.
pub(crate) struct SignalListeners {
    pub(crate) online: watch::Receiver<bool>,
    pub(crate) visible: watch::Receiver<bool>,
}
