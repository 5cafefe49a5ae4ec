//! Message handler registry and dispatch.

use std::collections::HashMap;

use ibrc_proto::{Message, MsgType};

use super::context::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{
    channel::{
        ChannelHandler, DelChannelHandler, GetTopicHandler, JoinHandler, LeaveHandler,
        ListHandler, SetTopicHandler,
    },
    connection::{ConnectHandler, DisconnectHandler, NickHandler, NickResHandler, QuitHandler},
    messaging::{MsgHandler, PrivMsgHandler},
    replies::{DirectedReplyHandler, HelpHandler, StatusHandler},
};

/// Registry of message handlers.
pub struct Registry {
    handlers: HashMap<MsgType, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<MsgType, Box<dyn Handler>> = HashMap::new();

        // Presence and nicknames
        handlers.insert(MsgType::Connect, Box::new(ConnectHandler));
        handlers.insert(MsgType::Disconnect, Box::new(DisconnectHandler));
        handlers.insert(MsgType::Quit, Box::new(QuitHandler));
        handlers.insert(MsgType::Nick, Box::new(NickHandler));
        handlers.insert(MsgType::NickRes, Box::new(NickResHandler));

        // Channel handlers
        handlers.insert(MsgType::Join, Box::new(JoinHandler));
        handlers.insert(MsgType::Channel, Box::new(ChannelHandler));
        handlers.insert(MsgType::Leave, Box::new(LeaveHandler));
        handlers.insert(MsgType::DelChannel, Box::new(DelChannelHandler));
        handlers.insert(MsgType::GetTopic, Box::new(GetTopicHandler));
        handlers.insert(MsgType::SetTopic, Box::new(SetTopicHandler));
        handlers.insert(MsgType::List, Box::new(ListHandler));

        // Messaging handlers
        handlers.insert(MsgType::Msg, Box::new(MsgHandler));
        handlers.insert(MsgType::PrivMsg, Box::new(PrivMsgHandler));

        // Replies routed by destination host
        handlers.insert(MsgType::Status, Box::new(StatusHandler));
        handlers.insert(MsgType::Topic, Box::new(DirectedReplyHandler));
        handlers.insert(MsgType::ListRes, Box::new(DirectedReplyHandler));
        handlers.insert(MsgType::Help, Box::new(HelpHandler));

        Self { handlers }
    }

    /// Dispatch a message to the handler for its type.
    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        match self.handlers.get(&msg.kind()) {
            Some(handler) => handler.handle(ctx, msg),
            None => Err(HandlerError::UnknownCommand(msg.kind())),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
