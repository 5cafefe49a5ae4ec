//! Message-type vocabulary.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// The closed set of message types spoken on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MsgType {
    /// A peer announces itself.
    Connect,
    /// A peer asks to leave the network gracefully.
    Disconnect,
    /// Nickname request.
    Nick,
    /// Nickname grant broadcast by the root.
    NickRes,
    /// Channel join request.
    Join,
    /// Channel leave request.
    Leave,
    /// Channel list request.
    List,
    /// Channel list reply.
    ListRes,
    /// Topic query.
    GetTopic,
    /// Topic change.
    SetTopic,
    /// Topic reply.
    Topic,
    /// Channel message.
    Msg,
    /// Private message to one channel member.
    PrivMsg,
    /// Channel state broadcast by the root.
    Channel,
    /// Channel deletion notice.
    DelChannel,
    /// Abrupt departure of a peer.
    Quit,
    /// Numeric status reply.
    Status,
    /// Help request or reply.
    Help,
}

impl MsgType {
    /// Every message type, in declaration order.
    pub const ALL: [MsgType; 18] = [
        MsgType::Connect,
        MsgType::Disconnect,
        MsgType::Nick,
        MsgType::NickRes,
        MsgType::Join,
        MsgType::Leave,
        MsgType::List,
        MsgType::ListRes,
        MsgType::GetTopic,
        MsgType::SetTopic,
        MsgType::Topic,
        MsgType::Msg,
        MsgType::PrivMsg,
        MsgType::Channel,
        MsgType::DelChannel,
        MsgType::Quit,
        MsgType::Status,
        MsgType::Help,
    ];

    /// Canonical wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            MsgType::Connect => "CONNECT",
            MsgType::Disconnect => "DISCONNECT",
            MsgType::Nick => "NICK",
            MsgType::NickRes => "NICKRES",
            MsgType::Join => "JOIN",
            MsgType::Leave => "LEAVE",
            MsgType::List => "LIST",
            MsgType::ListRes => "LISTRES",
            MsgType::GetTopic => "GETTOPIC",
            MsgType::SetTopic => "SETTOPIC",
            MsgType::Topic => "TOPIC",
            MsgType::Msg => "MSG",
            MsgType::PrivMsg => "PRIVMSG",
            MsgType::Channel => "CHANNEL",
            MsgType::DelChannel => "DELCHANNEL",
            MsgType::Quit => "QUIT",
            MsgType::Status => "STATUS",
            MsgType::Help => "HELP",
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MsgType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MsgType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}
