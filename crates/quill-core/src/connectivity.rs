//! Connectivity oracle

use std::sync::Arc;

use tokio::sync::watch;

/// Reports current online/offline status and a stream of status changes.
pub trait Connectivity: Send + Sync {
    /// Current status as last reported by the platform driver
    fn is_online(&self) -> bool;

    /// Subscribe to status changes
    fn changes(&self) -> watch::Receiver<bool>;
}

/// Watch-backed oracle.
///
/// The platform driver (or a test) flips the flag via [`set_online`];
/// repositories and schedulers read it through the [`Connectivity`] trait.
///
/// [`set_online`]: ConnectivityMonitor::set_online
#[derive(Clone)]
pub struct ConnectivityMonitor {
    status: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    #[must_use]
    pub fn new(initially_online: bool) -> Self {
        let (status, _) = watch::channel(initially_online);
        Self {
            status: Arc::new(status),
        }
    }

    /// Publish a status change; no-op when the status is unchanged
    pub fn set_online(&self, online: bool) {
        let changed = self.status.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::debug!(online, "connectivity changed");
        }
    }
}

impl Connectivity for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.status.borrow()
    }

    fn changes(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }
}
