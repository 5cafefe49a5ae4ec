//! The routing/authority state machine: parses each inbound line, hands it
//! to the registered handler, and cleans up after closed routes.

use ibrc_proto::Message;
use tracing::{debug, info};

use super::core::{Context, Registry};
use crate::config::LimitsConfig;
use crate::network::{Outbound, Route};
use crate::state::{Directory, NetworkRole, Removal};
use crate::telemetry::spans;

/// Per-server routing state: the directory, the network role and the
/// handler registry.
pub struct Router {
    directory: Directory,
    role: NetworkRole,
    registry: Registry,
    limits: LimitsConfig,
}

impl Router {
    /// A root with an empty directory.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            directory: Directory::new(),
            role: NetworkRole::root(),
            registry: Registry::new(),
            limits,
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn role(&self) -> &NetworkRole {
        &self.role
    }

    /// Make `route` the parent link; this server stops being root.
    pub fn set_parent(&mut self, route: Route) {
        self.role.set_parent(route);
    }

    /// Process one inbound frame. Malformed or unroutable lines are dropped.
    pub fn process(&mut self, source: Route, line: &str, sink: &mut dyn Outbound) {
        let msg = match Message::parse(line) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(%source, error = %e, "dropping malformed line");
                return;
            }
        };

        let span = spans::message(msg.kind().as_str(), source, msg.host());
        let _enter = span.enter();

        let mut ctx = Context {
            directory: &mut self.directory,
            role: &self.role,
            sink,
            source,
            raw: line,
            limits: &self.limits,
        };
        if let Err(e) = self.registry.dispatch(&mut ctx, &msg) {
            debug!(code = e.error_code(), error = %e, "message dropped");
        }
    }

    /// Clean up after a route has closed.
    ///
    /// Losing the parent makes this server root. Every peer behind the route
    /// is removed; below the root the parent is told with a QUIT per peer and
    /// a DELCHANNEL per channel that emptied.
    pub fn route_closed(&mut self, route: Route, sink: &mut dyn Outbound) -> Removal {
        let span = spans::route_closed(route);
        let _enter = span.enter();

        if self.role.is_parent(route) {
            self.role.clear_parent();
            info!("parent link lost, now acting as root");
        }

        let removal = self.directory.remove_route(route);
        if let Some(parent) = self.role.parent() {
            for peer in &removal.peers {
                sink.enqueue(
                    parent,
                    Message::Quit {
                        host: peer.host().to_string(),
                    }
                    .to_string(),
                );
            }
            for channel in &removal.emptied_channels {
                sink.enqueue(
                    parent,
                    Message::DelChannel {
                        channel: channel.clone(),
                    }
                    .to_string(),
                );
            }
        }
        if !removal.peers.is_empty() {
            info!(
                peers = removal.peers.len(),
                emptied = removal.emptied_channels.len(),
                "removed peers behind closed route"
            );
        }
        removal
    }
}
