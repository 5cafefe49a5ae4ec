//! Handler context and trait.

use ibrc_proto::{Message, StatusCode};

use crate::config::LimitsConfig;
use crate::error::{HandlerError, HandlerResult};
use crate::network::{Outbound, Route};
use crate::state::{Directory, NetworkRole, Peer};

/// Everything a handler may read or change while processing one message.
pub struct Context<'a> {
    /// Peer/channel registry.
    pub directory: &'a mut Directory,
    /// Root/parent state.
    pub role: &'a NetworkRole,
    /// Outgoing frames.
    pub sink: &'a mut dyn Outbound,
    /// Route the message arrived on.
    pub source: Route,
    /// The line as received, for verbatim forwarding.
    pub raw: &'a str,
    /// Configured limits.
    pub limits: &'a LimitsConfig,
}

impl<'a> Context<'a> {
    pub fn is_root(&self) -> bool {
        self.role.is_root()
    }

    /// Whether the message came down from the parent.
    pub fn from_parent(&self) -> bool {
        self.role.is_parent(self.source)
    }

    /// Send a message on one route.
    pub fn send(&mut self, route: Route, msg: &Message) {
        self.sink.enqueue(route, msg.to_string());
    }

    /// Send a message back on the arrival route.
    pub fn reply(&mut self, msg: &Message) {
        let source = self.source;
        self.send(source, msg);
    }

    pub fn reply_status(&mut self, host: &str, status: StatusCode) {
        self.reply(&Message::status(host, status));
    }

    /// Send a message on every attached route, the arrival route included.
    pub fn broadcast(&mut self, msg: &Message) {
        let line = msg.to_string();
        for route in self.sink.routes() {
            self.sink.enqueue(route, line.clone());
        }
    }

    /// Forward the received line to the parent, unless it came from there.
    ///
    /// Returns whether anything was sent.
    pub fn forward_to_parent(&mut self) -> bool {
        match self.role.parent() {
            Some(parent) if parent != self.source => {
                self.sink.enqueue(parent, self.raw.to_string());
                true
            }
            _ => false,
        }
    }

    /// Send the received line on each route once, skipping the arrival route.
    pub fn relay<I>(&mut self, routes: I)
    where
        I: IntoIterator<Item = Route>,
    {
        let mut sent: Vec<Route> = Vec::new();
        for route in routes {
            if route == self.source || sent.contains(&route) {
                continue;
            }
            sent.push(route);
            self.sink.enqueue(route, self.raw.to_string());
        }
    }

    /// Deliver a line addressed to `host`: down the owner's route when the
    /// host is known here, otherwise up to the parent. Never sends back out
    /// the arrival route.
    pub fn deliver(&mut self, host: &str, line: String) -> HandlerResult {
        let target = match self.directory.peer(host) {
            Some(peer) => Some(peer.route()),
            None => self.role.parent(),
        };
        match target {
            Some(route) if route != self.source => {
                self.sink.enqueue(route, line);
                Ok(())
            }
            _ => Err(HandlerError::NoRoute(host.to_string())),
        }
    }

    /// Look up the sender of a request and check it arrived on the sender's
    /// own route.
    pub fn sender(&self, host: &str) -> Result<&Peer, HandlerError> {
        let peer = self
            .directory
            .peer(host)
            .ok_or_else(|| HandlerError::UnknownSender(host.to_string()))?;
        if peer.route() != self.source {
            return Err(HandlerError::WrongRoute {
                host: host.to_string(),
                route: self.source,
            });
        }
        Ok(peer)
    }

    /// Requests travel upward only; one arriving from the parent is dropped.
    pub fn reject_from_parent(&self, msg: &Message) -> HandlerResult {
        if self.from_parent() {
            return Err(HandlerError::FromParent(msg.kind()));
        }
        Ok(())
    }

    /// Decisions travel downward only; one arriving from anywhere else is dropped.
    pub fn require_from_parent(&self, msg: &Message) -> HandlerResult {
        if !self.from_parent() {
            return Err(HandlerError::NotFromParent(msg.kind()));
        }
        Ok(())
    }
}

/// A handler for one message type.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}
