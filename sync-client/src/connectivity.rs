//! Connectivity providers.
//!
//! The sync layer asks a [`Connectivity`] whether the remote store is
//! reachable before every dispatch. Providers are injected at construction;
//! there is no process-wide listener.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Answers "is the remote store reachable right now?".
pub trait Connectivity: Send + Sync {
    /// Current reachability.
    fn is_online(&self) -> bool;
}

impl<F> Connectivity for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_online(&self) -> bool {
        self()
    }
}

impl Connectivity for watch::Receiver<bool> {
    fn is_online(&self) -> bool {
        *self.borrow()
    }
}

/// Shared flag the host flips when its network signal changes.
///
/// Clones share the flag.
#[derive(Debug, Clone)]
pub struct ConnectivityFlag {
    online: Arc<AtomicBool>,
}

impl ConnectivityFlag {
    /// Create a flag in the given state.
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// A flag that starts online.
    pub fn online() -> Self {
        Self::new(true)
    }

    /// A flag that starts offline.
    pub fn offline() -> Self {
        Self::new(false)
    }

    /// Update the flag.
    pub fn set(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::online()
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
