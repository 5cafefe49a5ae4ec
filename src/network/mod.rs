//! Network layer - the connection manager and its route handles.
//!
//! - [`ConnectionManager`]: listeners, routes, framed reads and writes
//! - [`Route`]/[`ListenerId`]: handles other layers hold by value
//! - [`Outbound`]: the send side the router writes to

mod transport;
mod manager;
mod route;

pub use manager::ConnectionManager;
pub use route::{CloseReason, Event, ListenerId, Route};

/// Where the router sends frames.
pub trait Outbound {
    /// Queue one frame on a route. Unknown routes are ignored.
    fn enqueue(&mut self, route: Route, line: String);

    /// Every route currently able to carry traffic.
    fn routes(&self) -> Vec<Route>;
}
