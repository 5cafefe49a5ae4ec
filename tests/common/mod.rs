//! Integration test common infrastructure.
//!
//! Runs servers in-process on ephemeral ports and drives them with
//! line-oriented TCP clients.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;
