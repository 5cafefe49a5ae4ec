//! Parsing and serialization of every message type in its wire grammar.

use ibrc_proto::{Message, MsgType, ProtocolError, StatusCode};

/// Lines in canonical form; each must survive parse → display unchanged.
const CANONICAL: &[&str] = &[
    "CONNECT a1",
    "DISCONNECT a1",
    "QUIT a1",
    "NICK a1 alice",
    "NICKRES a1 alice",
    "JOIN b1 lobby",
    "LEAVE b1 lobby",
    "LIST a1",
    "LISTRES a1 lobby rust",
    "GETTOPIC a1 lobby",
    "SETTOPIC b1 lobby weekly sync notes",
    "TOPIC a1 lobby weekly sync notes",
    "CHANNEL a1 lobby b1 weekly sync notes",
    "MSG a1 alice lobby hello",
    "PRIVMSG b1 a1 alice lobby bob see you there",
    "DELCHANNEL lobby",
    "STATUS a1 100",
    "HELP a1 /NICK /JOIN",
];

#[test]
fn canonical_lines_are_stable() {
    for line in CANONICAL {
        let msg = Message::parse(line).unwrap_or_else(|e| panic!("{}: {}", line, e));
        assert_eq!(&msg.to_string(), line);
    }
}

#[test]
fn every_type_is_covered() {
    let mut kinds: Vec<MsgType> = CANONICAL
        .iter()
        .map(|line| Message::parse(line).unwrap().kind())
        .collect();
    kinds.sort();
    kinds.dedup();
    assert_eq!(kinds.len(), MsgType::ALL.len());
}

#[test]
fn extra_whitespace_is_tolerated() {
    let msg: Message = "  nick   a1\talice ".parse().unwrap();
    assert_eq!(msg.to_string(), "NICK a1 alice");
}

#[test]
fn msg_sender_is_the_host_field() {
    let msg = Message::parse("MSG a1 alice lobby hello there").unwrap();
    assert_eq!(msg.host(), Some("a1"));
    match msg {
        Message::Msg { nick, channel, text, .. } => {
            assert_eq!(nick, "alice");
            assert_eq!(channel, "lobby");
            assert_eq!(text, "hello there");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn status_replies() {
    let msg = Message::parse("STATUS b1 405").unwrap();
    assert_eq!(msg.status_code(), Some(StatusCode::AlreadyInChannel));
    assert!(!StatusCode::AlreadyInChannel.is_success());
}

#[test]
fn malformed_lines_report_why() {
    let err = Message::parse("PRIVMSG b1 a1 alice lobby").unwrap_err();
    assert_eq!(err.to_string(), "PRIVMSG: missing field `dest-nick`");

    let err = Message::parse("WHOIS a1").unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownCommand(_)));
}
