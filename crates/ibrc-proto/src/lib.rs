//! # ibrc-proto
//!
//! Wire protocol for the ibrc chat network: a tree of servers exchanging
//! newline-terminated, whitespace-delimited text messages.
//!
//! ## Features
//!
//! - [`LineCodec`]: tokio codec that frames a byte stream into lines
//! - [`MsgType`]: the closed message-type vocabulary
//! - [`Message`]: typed messages with a total parser and a serializer
//! - [`StatusCode`]: numeric status replies grouped by hundreds
//!
//! ## Parsing
//!
//! ```rust
//! use ibrc_proto::{Message, MsgType};
//!
//! let msg: Message = "MSG a1 alice lobby hello there".parse().expect("valid message");
//! assert_eq!(msg.kind(), MsgType::Msg);
//! assert_eq!(msg.to_string(), "MSG a1 alice lobby hello there");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod line;
pub mod message;
pub mod status;

pub use self::command::MsgType;
pub use self::error::{ProtocolError, Result};
pub use self::line::{LineCodec, DEFAULT_MAX_LINE_LEN};
pub use self::message::Message;
pub use self::status::StatusCode;

/// Port a server listens on when none is configured.
pub const DEFAULT_SERVER_PORT: u16 = 5001;
