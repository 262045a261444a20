//! Connectivity state machine for offsync.
//!
//! This module provides a pure, side-effect-free state machine that turns
//! raw online/offline observations into lifecycle actions. It is
//! edge-triggered: observing the state we are already in does nothing.
//!
//! Running the hooks (and scheduling reconciliation) is performed by
//! sync-client, not by this module.

/// Connectivity as last observed - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing observed yet.
    Unknown,
    /// Remote store reachable.
    Online,
    /// Remote store unreachable; writes go to the local store.
    Offline,
}

impl LinkState {
    /// Create a new state machine with no observation.
    pub fn new() -> Self {
        Self::Unknown
    }

    /// Seed the state machine from an initial observation.
    pub fn observed(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// Only an `Offline -> Online` edge asks for the online hook; a first
    /// observation of "online" is not a reconnect.
    pub fn on_event(self, event: LinkEvent) -> (Self, Vec<LinkAction>) {
        match (self, event) {
            (Self::Offline, LinkEvent::WentOnline) => (Self::Online, vec![LinkAction::NotifyOnline]),
            (Self::Unknown, LinkEvent::WentOnline) => (Self::Online, vec![]),
            (Self::Online | Self::Unknown, LinkEvent::WentOffline) => {
                (Self::Offline, vec![LinkAction::NotifyOffline])
            }

            // Repeated observation of the current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if currently online.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Connectivity observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The connectivity provider now reports online.
    WentOnline,
    /// The connectivity provider now reports offline.
    WentOffline,
}

impl LinkEvent {
    /// Event for a raw boolean observation.
    pub fn from_online(online: bool) -> Self {
        if online {
            Self::WentOnline
        } else {
            Self::WentOffline
        }
    }
}

/// Actions to be executed by the sync-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Run the go-offline hook.
    NotifyOffline,
    /// Run the go-online hook (by default: reconcile after the settle delay).
    NotifyOnline,
}
