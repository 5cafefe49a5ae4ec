//! Messaging handlers: MSG and PRIVMSG.

use ibrc_proto::{Message, StatusCode};
use tracing::debug;

use super::core::{Context, Handler};
use crate::error::{DirectoryError, HandlerResult};

/// Handler for MSG.
///
/// A message fans out along the channel's routes, plus the parent link
/// below the root, so every edge of the tree carries it exactly once.
pub struct MsgHandler;

impl Handler for MsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Msg { host, channel, .. } = msg else {
            return Ok(());
        };

        if ctx.from_parent() {
            let routes = match ctx.directory.channel(channel) {
                Some(chan) => chan.routes(),
                None => return Err(DirectoryError::UnknownChannel(channel.clone()).into()),
            };
            ctx.relay(routes);
            return Ok(());
        }

        ctx.sender(host)?;
        let (is_member, mut routes) = match ctx.directory.channel(channel) {
            Some(chan) => (chan.is_member(host), chan.routes()),
            None if ctx.is_root() => {
                ctx.reply_status(host, StatusCode::NoSuchChannel);
                return Ok(());
            }
            None => {
                ctx.forward_to_parent();
                return Ok(());
            }
        };
        if !is_member {
            ctx.reply_status(host, StatusCode::NotInChannel);
            return Ok(());
        }

        routes.extend(ctx.role.parent());
        ctx.relay(routes);
        if ctx.is_root() {
            ctx.reply_status(host, StatusCode::MsgDelivered);
        }
        Ok(())
    }
}

/// Handler for PRIVMSG.
///
/// A request (address equal to the sender) is resolved by the first server
/// that knows both the channel and the destination nickname; that server
/// readdresses it to the destination host. A readdressed message is then
/// delivered hop by hop like any directed reply.
pub struct PrivMsgHandler;

impl Handler for PrivMsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::PrivMsg {
            host,
            sender_host,
            sender_nick,
            channel,
            dest_nick,
            text,
        } = msg
        else {
            return Ok(());
        };

        // Anything from the parent has already been resolved, including a
        // message a sender addressed to themselves.
        if ctx.from_parent() || host != sender_host {
            return ctx.deliver(host, ctx.raw.to_string());
        }

        ctx.sender(sender_host)?;

        let sender_in_channel = match ctx.directory.channel(channel) {
            Some(chan) => chan.is_member(sender_host),
            None if ctx.is_root() => {
                ctx.reply_status(sender_host, StatusCode::NoSuchChannel);
                return Ok(());
            }
            None => {
                ctx.forward_to_parent();
                return Ok(());
            }
        };
        if !sender_in_channel {
            ctx.reply_status(sender_host, StatusCode::NotInChannel);
            return Ok(());
        }

        let dest = ctx
            .directory
            .peer_by_nick(dest_nick)
            .map(|p| (p.host().to_string(), p.route()));
        let Some((dest_host, dest_route)) = dest else {
            if ctx.is_root() {
                ctx.reply_status(sender_host, StatusCode::NoSuchClient);
            } else {
                ctx.forward_to_parent();
            }
            return Ok(());
        };
        let dest_in_channel = ctx
            .directory
            .channel(channel)
            .is_some_and(|chan| chan.is_member(&dest_host));
        if !dest_in_channel {
            ctx.reply_status(sender_host, StatusCode::NoSuchClientInChannel);
            return Ok(());
        }

        debug!(from = %sender_host, to = %dest_host, %channel, "private message resolved");
        let delivery = Message::PrivMsg {
            host: dest_host,
            sender_host: sender_host.clone(),
            sender_nick: sender_nick.clone(),
            channel: channel.clone(),
            dest_nick: dest_nick.clone(),
            text: text.clone(),
        };
        ctx.send(dest_route, &delivery);
        ctx.reply_status(sender_host, StatusCode::PrivmsgDelivered);
        Ok(())
    }
}
