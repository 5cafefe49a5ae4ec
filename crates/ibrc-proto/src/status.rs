//! Numeric status replies.
//!
//! Codes are grouped by hundreds: 1xx connect, 2xx disconnect, 3xx nick,
//! 4xx join/leave, 5xx authorization, 6xx message delivery.

use std::fmt;

/// A status code carried by a `STATUS` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum StatusCode {
    ConnectSuccess = 100,
    ConnectError = 101,
    DisconnectSuccess = 200,
    DisconnectError = 201,
    NickUnique = 300,
    NickNotUnique = 301,
    NickNotAuthorized = 302,
    NickNotSet = 303,
    JoinNewSuccess = 400,
    JoinKnownSuccess = 401,
    LeaveSuccess = 402,
    NotInChannel = 403,
    NoSuchChannel = 404,
    AlreadyInChannel = 405,
    NotChannelOp = 500,
    MsgDelivered = 600,
    PrivmsgDelivered = 601,
    NoSuchClient = 602,
    NoSuchClientInChannel = 603,
}

impl StatusCode {
    /// Look up a status code by its numeric value.
    pub fn from_code(code: u16) -> Option<StatusCode> {
        use StatusCode::*;
        let status = match code {
            100 => ConnectSuccess,
            101 => ConnectError,
            200 => DisconnectSuccess,
            201 => DisconnectError,
            300 => NickUnique,
            301 => NickNotUnique,
            302 => NickNotAuthorized,
            303 => NickNotSet,
            400 => JoinNewSuccess,
            401 => JoinKnownSuccess,
            402 => LeaveSuccess,
            403 => NotInChannel,
            404 => NoSuchChannel,
            405 => AlreadyInChannel,
            500 => NotChannelOp,
            600 => MsgDelivered,
            601 => PrivmsgDelivered,
            602 => NoSuchClient,
            603 => NoSuchClientInChannel,
            _ => return None,
        };
        Some(status)
    }

    /// Numeric value sent on the wire.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Short label used in logs.
    pub fn name(self) -> &'static str {
        use StatusCode::*;
        match self {
            ConnectSuccess => "connect_success",
            ConnectError => "connect_error",
            DisconnectSuccess => "disconnect_success",
            DisconnectError => "disconnect_error",
            NickUnique => "nick_unique",
            NickNotUnique => "nick_not_unique",
            NickNotAuthorized => "nick_not_authorized",
            NickNotSet => "nick_not_set",
            JoinNewSuccess => "join_new_success",
            JoinKnownSuccess => "join_known_success",
            LeaveSuccess => "leave_success",
            NotInChannel => "not_in_channel",
            NoSuchChannel => "no_such_channel",
            AlreadyInChannel => "already_in_channel",
            NotChannelOp => "not_channel_op",
            MsgDelivered => "msg_delivered",
            PrivmsgDelivered => "privmsg_delivered",
            NoSuchClient => "no_such_client",
            NoSuchClientInChannel => "no_such_client_in_channel",
        }
    }

    /// Whether the code reports a successful request.
    pub fn is_success(self) -> bool {
        use StatusCode::*;
        matches!(
            self,
            ConnectSuccess
                | DisconnectSuccess
                | NickUnique
                | JoinNewSuccess
                | JoinKnownSuccess
                | LeaveSuccess
                | MsgDelivered
                | PrivmsgDelivered
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> u16 {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in [100, 101, 200, 201, 300, 301, 302, 303, 400, 401, 402, 403, 404, 405, 500, 600, 601, 602, 603] {
            let status = StatusCode::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(StatusCode::from_code(0), None);
        assert_eq!(StatusCode::from_code(304), None);
        assert_eq!(StatusCode::from_code(700), None);
    }

    #[test]
    fn success_flags() {
        assert!(StatusCode::JoinKnownSuccess.is_success());
        assert!(!StatusCode::NickNotUnique.is_success());
        assert!(!StatusCode::NotChannelOp.is_success());
        assert_eq!(StatusCode::NoSuchChannel.name(), "no_such_channel");
        assert_eq!(StatusCode::MsgDelivered.to_string(), "600");
    }
}
