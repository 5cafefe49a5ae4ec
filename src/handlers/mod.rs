//! Message handlers - the routing/authority state machine.
//!
//! Handlers are organized by family:
//! - [`connection`]: CONNECT, DISCONNECT, QUIT, NICK, NICKRES
//! - [`channel`]: JOIN, CHANNEL, LEAVE, DELCHANNEL, GETTOPIC, SETTOPIC, LIST
//! - [`messaging`]: MSG, PRIVMSG
//! - [`replies`]: STATUS, TOPIC, LISTRES, HELP
//!
//! Authority rules shared by all of them:
//! - requests travel up: a non-root forwards what it cannot decide to its
//!   parent verbatim, and drops requests that arrive *from* the parent
//! - decisions travel down: NICKRES and CHANNEL are accepted only from the
//!   parent and applied only where the addressed host is known
//! - replies are delivered by host: down the owner's route, or up when the
//!   host is not in this subtree

pub mod channel;
pub mod connection;
pub mod core;
pub mod messaging;
pub mod replies;
mod router;


pub use self::core::{Context, Handler, Registry};
pub use router::Router;
