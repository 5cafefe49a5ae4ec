//! Unified error handling for ibrcd.
//!
//! One error type per layer: directory mutations, message handling and
//! process startup. Configuration errors live with the config module and
//! wire-level errors in `ibrc_proto`.

use std::io;

use ibrc_proto::{MsgType, ProtocolError};
use thiserror::Error;

use crate::network::Route;

// ============================================================================
// Directory Errors
// ============================================================================

/// Directory mutation errors. A failed mutation leaves the directory as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("host already registered: {0}")]
    HostConflict(String),

    #[error("nickname in use: {0}")]
    NameConflict(String),

    #[error("no such peer: {0}")]
    UnknownPeer(String),

    #[error("no such channel: {0}")]
    UnknownChannel(String),

    #[error("channel already exists: {0}")]
    ChannelExists(String),

    #[error("{host} is already in {channel}")]
    AlreadyMember { host: String, channel: String },

    #[error("{host} is not in {channel}")]
    NotMember { host: String, channel: String },
}

// ============================================================================
// Handler Errors (message processing)
// ============================================================================

/// Reasons a message is dropped without a reply.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("malformed message: {0}")]
    Malformed(#[from] ProtocolError),

    #[error("channel name too long: {0}")]
    ChannelNameTooLong(String),

    #[error("unknown sender: {0}")]
    UnknownSender(String),

    #[error("{host} is not reachable through {route}")]
    WrongRoute { host: String, route: Route },

    #[error("{0} is only accepted from below")]
    FromParent(MsgType),

    #[error("{0} is only accepted from the parent")]
    NotFromParent(MsgType),

    #[error("no route to {0}")]
    NoRoute(String),

    #[error("no handler for {0}")]
    UnknownCommand(MsgType),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::ChannelNameTooLong(_) => "channel_name_too_long",
            Self::UnknownSender(_) => "unknown_sender",
            Self::WrongRoute { .. } => "wrong_route",
            Self::FromParent(_) => "from_parent",
            Self::NotFromParent(_) => "not_from_parent",
            Self::NoRoute(_) => "no_route",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Directory(DirectoryError::NameConflict(_)) => "name_conflict",
            Self::Directory(_) => "directory",
        }
    }
}

/// Result type for message handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Startup Errors
// ============================================================================

/// Failures that prevent the server from starting or keep it from running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to parent {host}:{port}: {source}")]
    Parent {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),
}
