//! Telemetry utilities for message tracing.

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    use crate::network::Route;

    /// Create a span for the event loop of one server.
    pub fn server(listen: &str) -> Span {
        info_span!("server", listen = %listen)
    }

    /// Create a span for one inbound message.
    pub fn message(kind: &str, source: Route, host: Option<&str>) -> Span {
        if let Some(host) = host {
            debug_span!("message", kind = %kind, source = %source, host = %host)
        } else {
            debug_span!("message", kind = %kind, source = %source)
        }
    }

    /// Create a span for cleanup after a route closes.
    pub fn route_closed(route: Route) -> Span {
        info_span!("route_closed", route = %route)
    }
}
