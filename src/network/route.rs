//! Handles and events surfaced by the connection manager.

use std::fmt;
use std::io;

/// Opaque handle for one live connection.
///
/// Ids grow monotonically and are never reused within a process, so a
/// handle held past its route's removal can never address a newer route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route(u64);

impl Route {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric id.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route#{}", self.0)
    }
}

/// Handle for one listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Why a route stopped carrying traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The remote end closed the stream.
    PeerClosed,
    /// Reading or writing failed.
    Transport(io::ErrorKind),
    /// The outbound queue exceeded its bound.
    Overflow,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::PeerClosed => f.write_str("peer closed"),
            CloseReason::Transport(kind) => write!(f, "transport error: {}", kind),
            CloseReason::Overflow => f.write_str("outbound queue overflow"),
        }
    }
}

/// Readiness notification returned by
/// [`ConnectionManager::poll_events`](super::ConnectionManager::poll_events).
#[derive(Debug)]
pub enum Event {
    /// At least one connection is waiting to be accepted.
    Acceptable(ListenerId),
    /// At least one frame is waiting on the route.
    Readable(Route),
    /// The route is dead. Surfaced once per route.
    Closed(Route, CloseReason),
    /// The listener can no longer accept connections.
    ListenerFailed(ListenerId, io::Error),
}
