//! Server state: the peer/channel directory and the local network role.

mod directory;
mod role;

pub use directory::{Channel, Directory, Peer, Removal};
pub use role::NetworkRole;
