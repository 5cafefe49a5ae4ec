//! ibrcd - a tree-federated chat daemon.
//!
//! Servers connect into a tree. The server without a parent is the root and
//! decides nicknames and channel creation; every other server relays
//! requests up and decisions down.
//!
//! - [`network`]: connection manager on tokio
//! - [`state`]: peer/channel directory and network role
//! - [`handlers`]: the routing/authority state machine
//! - [`server`]: startup and the event loop

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use error::StartupError;
pub use server::Server;
