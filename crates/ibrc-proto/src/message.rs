//! Typed protocol messages.
//!
//! Every message is one line: a type token followed by whitespace-delimited
//! fields. The last field of some types is "rest of line" and may contain
//! spaces.

use std::fmt;
use std::str::FromStr;

use crate::command::MsgType;
use crate::error::{ProtocolError, Result};
use crate::status::StatusCode;

/// A parsed protocol message.
///
/// `host` is the host identifier a message is about or addressed to. For
/// [`Message::PrivMsg`] it is the routing address: equal to `sender_host`
/// on a request, rewritten to the destination's host once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Message {
    Connect { host: String },
    Disconnect { host: String },
    Quit { host: String },
    Nick { host: String, nick: String },
    NickRes { host: String, nick: String },
    Join { host: String, channel: String },
    Leave { host: String, channel: String },
    List { host: String },
    ListRes { host: String, channels: Vec<String> },
    GetTopic { host: String, channel: String },
    SetTopic { host: String, channel: String, topic: String },
    Topic { host: String, channel: String, topic: String },
    Channel { host: String, channel: String, op: String, topic: String },
    Msg { host: String, nick: String, channel: String, text: String },
    PrivMsg {
        host: String,
        sender_host: String,
        sender_nick: String,
        channel: String,
        dest_nick: String,
        text: String,
    },
    DelChannel { channel: String },
    Status { host: String, code: u16 },
    Help { host: String, commands: Vec<String> },
}

/// Cursor over the fields of one line.
struct Fields<'a> {
    command: &'static str,
    rest: &'a str,
}

impl<'a> Fields<'a> {
    fn new(command: &'static str, rest: &'a str) -> Self {
        Self { command, rest }
    }

    fn next(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            self.rest = trimmed;
            return None;
        }
        let end = trimmed
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(trimmed.len());
        let (field, rest) = trimmed.split_at(end);
        self.rest = rest;
        Some(field)
    }

    fn field(&mut self, name: &'static str) -> Result<String> {
        self.next()
            .map(str::to_string)
            .ok_or(ProtocolError::MissingField {
                command: self.command,
                field: name,
            })
    }

    /// Remainder of the line, possibly empty.
    fn rest(self) -> String {
        self.rest.trim_start().to_string()
    }

    fn list(mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(field) = self.next() {
            out.push(field.to_string());
        }
        out
    }
}

impl Message {
    /// Parse one line (without terminator).
    pub fn parse(line: &str) -> Result<Message> {
        let line = line.trim_start();
        let (token, rest) = match line.find(|c: char| c.is_ascii_whitespace()) {
            Some(idx) => line.split_at(idx),
            None => (line, ""),
        };
        if token.is_empty() {
            return Err(ProtocolError::EmptyMessage);
        }
        let kind: MsgType = token.parse()?;
        let mut f = Fields::new(kind.as_str(), rest);

        let msg = match kind {
            MsgType::Connect => Message::Connect {
                host: f.field("host")?,
            },
            MsgType::Disconnect => Message::Disconnect {
                host: f.field("host")?,
            },
            MsgType::Quit => Message::Quit {
                host: f.field("host")?,
            },
            MsgType::Nick => Message::Nick {
                host: f.field("host")?,
                nick: f.field("nick")?,
            },
            MsgType::NickRes => Message::NickRes {
                host: f.field("host")?,
                nick: f.field("nick")?,
            },
            MsgType::Join => Message::Join {
                host: f.field("host")?,
                channel: f.field("channel")?,
            },
            MsgType::Leave => Message::Leave {
                host: f.field("host")?,
                channel: f.field("channel")?,
            },
            MsgType::List => Message::List {
                host: f.field("host")?,
            },
            MsgType::ListRes => Message::ListRes {
                host: f.field("host")?,
                channels: f.list(),
            },
            MsgType::GetTopic => Message::GetTopic {
                host: f.field("host")?,
                channel: f.field("channel")?,
            },
            MsgType::SetTopic => Message::SetTopic {
                host: f.field("host")?,
                channel: f.field("channel")?,
                topic: f.rest(),
            },
            MsgType::Topic => Message::Topic {
                host: f.field("host")?,
                channel: f.field("channel")?,
                topic: f.rest(),
            },
            MsgType::Channel => Message::Channel {
                host: f.field("host")?,
                channel: f.field("channel")?,
                op: f.field("op")?,
                topic: f.rest(),
            },
            MsgType::Msg => Message::Msg {
                host: f.field("sender-host")?,
                nick: f.field("sender-nick")?,
                channel: f.field("channel")?,
                text: f.rest(),
            },
            MsgType::PrivMsg => Message::PrivMsg {
                host: f.field("host")?,
                sender_host: f.field("sender-host")?,
                sender_nick: f.field("sender-nick")?,
                channel: f.field("channel")?,
                dest_nick: f.field("dest-nick")?,
                text: f.rest(),
            },
            MsgType::DelChannel => Message::DelChannel {
                channel: f.field("channel")?,
            },
            MsgType::Status => {
                let host = f.field("host")?;
                let raw = f.field("code")?;
                let code = raw
                    .parse::<u16>()
                    .map_err(|_| ProtocolError::InvalidStatusCode(raw))?;
                Message::Status { host, code }
            }
            MsgType::Help => Message::Help {
                host: f.field("host")?,
                commands: f.list(),
            },
        };
        Ok(msg)
    }

    /// A `STATUS` reply addressed to `host`.
    pub fn status(host: impl Into<String>, status: StatusCode) -> Message {
        Message::Status {
            host: host.into(),
            code: status.code(),
        }
    }

    /// The message type.
    pub fn kind(&self) -> MsgType {
        match self {
            Message::Connect { .. } => MsgType::Connect,
            Message::Disconnect { .. } => MsgType::Disconnect,
            Message::Quit { .. } => MsgType::Quit,
            Message::Nick { .. } => MsgType::Nick,
            Message::NickRes { .. } => MsgType::NickRes,
            Message::Join { .. } => MsgType::Join,
            Message::Leave { .. } => MsgType::Leave,
            Message::List { .. } => MsgType::List,
            Message::ListRes { .. } => MsgType::ListRes,
            Message::GetTopic { .. } => MsgType::GetTopic,
            Message::SetTopic { .. } => MsgType::SetTopic,
            Message::Topic { .. } => MsgType::Topic,
            Message::Channel { .. } => MsgType::Channel,
            Message::Msg { .. } => MsgType::Msg,
            Message::PrivMsg { .. } => MsgType::PrivMsg,
            Message::DelChannel { .. } => MsgType::DelChannel,
            Message::Status { .. } => MsgType::Status,
            Message::Help { .. } => MsgType::Help,
        }
    }

    /// The leading host field, if the message type has one.
    pub fn host(&self) -> Option<&str> {
        match self {
            Message::Connect { host }
            | Message::Disconnect { host }
            | Message::Quit { host }
            | Message::Nick { host, .. }
            | Message::NickRes { host, .. }
            | Message::Join { host, .. }
            | Message::Leave { host, .. }
            | Message::List { host }
            | Message::ListRes { host, .. }
            | Message::GetTopic { host, .. }
            | Message::SetTopic { host, .. }
            | Message::Topic { host, .. }
            | Message::Channel { host, .. }
            | Message::Msg { host, .. }
            | Message::PrivMsg { host, .. }
            | Message::Status { host, .. }
            | Message::Help { host, .. } => Some(host),
            Message::DelChannel { .. } => None,
        }
    }

    /// The status code of a `STATUS` message, if it is a known one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Message::Status { code, .. } => StatusCode::from_code(*code),
            _ => None,
        }
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Message::parse(s)
    }
}

/// Writes ` <text>` unless `text` is empty.
fn write_rest(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if text.is_empty() {
        Ok(())
    } else {
        write!(f, " {}", text)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for item in items {
        write!(f, " {}", item)?;
    }
    Ok(())
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            Message::Connect { host }
            | Message::Disconnect { host }
            | Message::Quit { host }
            | Message::List { host } => write!(f, "{} {}", kind, host),
            Message::Nick { host, nick } | Message::NickRes { host, nick } => {
                write!(f, "{} {} {}", kind, host, nick)
            }
            Message::Join { host, channel }
            | Message::Leave { host, channel }
            | Message::GetTopic { host, channel } => write!(f, "{} {} {}", kind, host, channel),
            Message::ListRes { host, channels } => {
                write!(f, "{} {}", kind, host)?;
                write_list(f, channels)
            }
            Message::SetTopic {
                host,
                channel,
                topic,
            }
            | Message::Topic {
                host,
                channel,
                topic,
            } => {
                write!(f, "{} {} {}", kind, host, channel)?;
                write_rest(f, topic)
            }
            Message::Channel {
                host,
                channel,
                op,
                topic,
            } => {
                write!(f, "{} {} {} {}", kind, host, channel, op)?;
                write_rest(f, topic)
            }
            Message::Msg {
                host,
                nick,
                channel,
                text,
            } => {
                write!(f, "{} {} {} {}", kind, host, nick, channel)?;
                write_rest(f, text)
            }
            Message::PrivMsg {
                host,
                sender_host,
                sender_nick,
                channel,
                dest_nick,
                text,
            } => {
                write!(
                    f,
                    "{} {} {} {} {} {}",
                    kind, host, sender_host, sender_nick, channel, dest_nick
                )?;
                write_rest(f, text)
            }
            Message::DelChannel { channel } => write!(f, "{} {}", kind, channel),
            Message::Status { host, code } => write!(f, "{} {} {}", kind, host, code),
            Message::Help { host, commands } => {
                write!(f, "{} {}", kind, host)?;
                write_list(f, commands)
            }
        }
    }
}
