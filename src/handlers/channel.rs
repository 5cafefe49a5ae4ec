//! Channel handlers: JOIN, CHANNEL, LEAVE, DELCHANNEL, GETTOPIC, SETTOPIC, LIST.

use ibrc_proto::{Message, StatusCode};
use tracing::{debug, info};

use super::core::{Context, Handler};
use crate::error::{DirectoryError, HandlerError, HandlerResult};

fn check_channel_name(ctx: &Context<'_>, channel: &str) -> HandlerResult {
    if channel.len() > ctx.limits.max_channel_len {
        return Err(HandlerError::ChannelNameTooLong(channel.to_string()));
    }
    Ok(())
}

/// Handler for JOIN.
///
/// Only the root creates channels. Everywhere else the request goes up
/// unchanged and the channel appears locally once the root's CHANNEL
/// announcement comes back down.
pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Join { host, channel } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;
        check_channel_name(ctx, channel)?;
        let has_nick = ctx.sender(host)?.has_nick();

        if !ctx.is_root() {
            ctx.forward_to_parent();
            return Ok(());
        }

        if !has_nick {
            ctx.reply_status(host, StatusCode::NickNotSet);
            return Ok(());
        }

        let status = match ctx.directory.channel(channel) {
            Some(chan) if chan.is_member(host) => {
                ctx.reply_status(host, StatusCode::AlreadyInChannel);
                return Ok(());
            }
            Some(_) => StatusCode::JoinKnownSuccess,
            None => {
                ctx.directory.create_channel(channel, host, "")?;
                info!(%channel, op = %host, "channel created");
                StatusCode::JoinNewSuccess
            }
        };
        ctx.directory.join(channel, host)?;

        let announcement = match ctx.directory.channel(channel) {
            Some(chan) => Message::Channel {
                host: host.clone(),
                channel: channel.clone(),
                op: chan.op().to_string(),
                topic: chan.topic().to_string(),
            },
            None => return Err(DirectoryError::UnknownChannel(channel.clone()).into()),
        };
        ctx.broadcast(&announcement);
        ctx.reply_status(host, status);
        Ok(())
    }
}

/// Handler for CHANNEL: the root's record of a successful join.
///
/// Applied and passed down only where the joining host lives in this
/// subtree.
pub struct ChannelHandler;

impl Handler for ChannelHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Channel {
            host,
            channel,
            op,
            topic,
        } = msg
        else {
            return Ok(());
        };
        ctx.require_from_parent(msg)?;
        if ctx.directory.peer(host).is_none() {
            return Ok(());
        }

        if ctx.directory.channel(channel).is_some() {
            ctx.directory.set_op(channel, op)?;
            ctx.directory.set_topic(channel, topic)?;
        } else {
            ctx.directory.create_channel(channel, op, topic)?;
            debug!(%channel, %op, "channel learned from parent");
        }
        match ctx.directory.join(channel, host) {
            Ok(()) | Err(DirectoryError::AlreadyMember { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        ctx.deliver(host, ctx.raw.to_string())
    }
}

/// Handler for LEAVE.
pub struct LeaveHandler;

impl Handler for LeaveHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Leave { host, channel } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;
        ctx.sender(host)?;

        let is_member = match ctx.directory.channel(channel) {
            Some(chan) => chan.is_member(host),
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

        if ctx.directory.leave(channel, host)? {
            info!(%channel, "channel emptied");
        }
        if ctx.is_root() {
            ctx.reply_status(host, StatusCode::LeaveSuccess);
        } else {
            ctx.forward_to_parent();
        }
        Ok(())
    }
}

/// Handler for DELCHANNEL.
///
/// From the parent it is authoritative: the channel goes and its member
/// routes are told. From below it only reports that a subtree has no
/// members left; a channel that still has members here is kept.
pub struct DelChannelHandler;

impl Handler for DelChannelHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::DelChannel { channel } = msg else {
            return Ok(());
        };

        if ctx.from_parent() {
            if let Some(chan) = ctx.directory.delete_channel(channel) {
                info!(%channel, "channel deleted by parent");
                ctx.relay(chan.routes());
            }
            return Ok(());
        }

        match ctx.directory.channel(channel) {
            Some(chan) if chan.member_count() > 0 => {
                debug!(%channel, members = chan.member_count(), "channel still in use");
            }
            _ => {
                ctx.directory.delete_channel(channel);
                ctx.forward_to_parent();
            }
        }
        Ok(())
    }
}

/// Handler for GETTOPIC.
pub struct GetTopicHandler;

impl Handler for GetTopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::GetTopic { host, channel } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;
        ctx.sender(host)?;

        match ctx.directory.channel(channel).map(|c| c.topic().to_string()) {
            Some(topic) => ctx.reply(&Message::Topic {
                host: host.clone(),
                channel: channel.clone(),
                topic,
            }),
            None if ctx.is_root() => ctx.reply_status(host, StatusCode::NoSuchChannel),
            None => {
                ctx.forward_to_parent();
            }
        }
        Ok(())
    }
}

/// Handler for SETTOPIC.
///
/// Only the channel op may change the topic. An accepted change is relayed
/// along every channel edge once.
pub struct SetTopicHandler;

impl Handler for SetTopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::SetTopic {
            host,
            channel,
            topic,
        } = msg
        else {
            return Ok(());
        };

        if ctx.from_parent() {
            let routes = match ctx.directory.channel(channel) {
                Some(chan) => chan.routes(),
                None => return Err(DirectoryError::UnknownChannel(channel.clone()).into()),
            };
            ctx.directory.set_topic(channel, topic)?;
            ctx.relay(routes);
            return Ok(());
        }

        ctx.sender(host)?;
        let (is_member, is_op, mut routes) = match ctx.directory.channel(channel) {
            Some(chan) => (chan.is_member(host), chan.op() == host, chan.routes()),
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
        if !is_op {
            ctx.reply_status(host, StatusCode::NotChannelOp);
            return Ok(());
        }

        ctx.directory.set_topic(channel, topic)?;
        info!(%channel, op = %host, "topic changed");
        routes.extend(ctx.role.parent());
        ctx.relay(routes);
        Ok(())
    }
}

/// Handler for LIST. Only the root knows every channel.
pub struct ListHandler;

impl Handler for ListHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::List { host } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;
        ctx.sender(host)?;

        if !ctx.is_root() {
            ctx.forward_to_parent();
            return Ok(());
        }
        let channels = ctx.directory.channel_names();
        ctx.reply(&Message::ListRes {
            host: host.clone(),
            channels,
        });
        Ok(())
    }
}
