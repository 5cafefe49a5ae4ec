//! Replies routed by destination host: STATUS, TOPIC, LISTRES, HELP.

use ibrc_proto::{Message, StatusCode};
use tracing::info;

use super::core::{Context, Handler};
use crate::error::HandlerResult;

/// Commands a client console offers, announced in HELP replies.
pub const CLIENT_COMMANDS: &[&str] = &[
    "/NICK",
    "/JOIN",
    "/LEAVE",
    "/GETTOPIC",
    "/SETTOPIC",
    "/MSG",
    "/PRIVMSG",
    "/LIST",
    "/QUIT",
    "/HELP",
];

/// Handler for TOPIC and LISTRES: pass toward the addressed host.
pub struct DirectedReplyHandler;

impl Handler for DirectedReplyHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(host) = msg.host() else {
            return Ok(());
        };
        ctx.deliver(host, ctx.raw.to_string())
    }
}

/// Handler for STATUS.
///
/// Besides passing the reply on, a status from the parent replays the
/// root's decision locally: a refused CONNECT or an acknowledged DISCONNECT
/// removes the peer here too.
pub struct StatusHandler;

impl Handler for StatusHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Status { host, .. } = msg else {
            return Ok(());
        };
        let delivered = ctx.deliver(host, ctx.raw.to_string());

        if ctx.from_parent()
            && matches!(
                msg.status_code(),
                Some(StatusCode::ConnectError | StatusCode::DisconnectSuccess)
            )
            && ctx.directory.peer(host).is_some()
        {
            let removal = ctx.directory.remove_peer(host)?;
            info!(%host, emptied = removal.emptied_channels.len(), "peer removed by root decision");
        }
        delivered
    }
}

/// Handler for HELP.
///
/// A request is answered by the server the client is attached to; a reply
/// from the parent is passed toward its host.
pub struct HelpHandler;

impl Handler for HelpHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Help { host, .. } = msg else {
            return Ok(());
        };
        if ctx.from_parent() {
            return ctx.deliver(host, ctx.raw.to_string());
        }

        ctx.reply(&Message::Help {
            host: host.clone(),
            commands: CLIENT_COMMANDS.iter().map(|c| c.to_string()).collect(),
        });
        Ok(())
    }
}
