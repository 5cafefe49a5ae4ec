//! Presence and nickname handlers: CONNECT, DISCONNECT, QUIT, NICK, NICKRES.

use ibrc_proto::{Message, StatusCode};
use tracing::{debug, info, warn};

use super::core::{Context, Handler};
use crate::error::{DirectoryError, HandlerResult};

/// A nickname the root is willing to grant.
pub fn is_valid_nick(nick: &str, max_len: usize) -> bool {
    !nick.is_empty()
        && nick.len() <= max_len
        && nick
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Handler for CONNECT.
///
/// Registers the host on the arrival route. The root acknowledges; other
/// servers pass the request up and relay the root's answer later.
pub struct ConnectHandler;

impl Handler for ConnectHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Connect { host } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;

        match ctx.directory.peer(host).map(|p| p.route()) {
            Some(route) if route != ctx.source => {
                debug!(%host, existing = %route, "host already connected elsewhere");
                ctx.reply_status(host, StatusCode::ConnectError);
                return Ok(());
            }
            Some(_) => {}
            None => {
                ctx.directory.insert_peer(host, ctx.source)?;
                info!(%host, route = %ctx.source, "peer connected");
            }
        }

        if ctx.is_root() {
            ctx.reply_status(host, StatusCode::ConnectSuccess);
        } else {
            ctx.forward_to_parent();
        }
        Ok(())
    }
}

/// Handler for DISCONNECT.
///
/// Only the root removes the peer right away; below the root the peer is
/// removed when the root's acknowledgement passes back down.
pub struct DisconnectHandler;

impl Handler for DisconnectHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Disconnect { host } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;
        ctx.sender(host)?;

        if !ctx.is_root() {
            ctx.forward_to_parent();
            return Ok(());
        }

        let removal = ctx.directory.remove_peer(host)?;
        info!(%host, emptied = removal.emptied_channels.len(), "peer disconnected");
        ctx.reply_status(host, StatusCode::DisconnectSuccess);
        Ok(())
    }
}

/// Handler for QUIT: the peer leaves without acknowledgement.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Quit { host } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;
        ctx.sender(host)?;

        let removal = ctx.directory.remove_peer(host)?;
        info!(%host, emptied = removal.emptied_channels.len(), "peer quit");
        ctx.forward_to_parent();
        Ok(())
    }
}

/// Handler for NICK.
///
/// The root is the only arbiter of nicknames: it validates, renames,
/// acknowledges the requester and announces the grant on every route.
pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::Nick { host, nick } = msg else {
            return Ok(());
        };
        ctx.reject_from_parent(msg)?;
        ctx.sender(host)?;

        if !ctx.is_root() {
            ctx.forward_to_parent();
            return Ok(());
        }

        if !is_valid_nick(nick, ctx.limits.max_nick_len) {
            ctx.reply_status(host, StatusCode::NickNotAuthorized);
            return Ok(());
        }
        match ctx.directory.rename_peer(host, nick) {
            Ok(()) => {}
            Err(DirectoryError::NameConflict(_)) => {
                ctx.reply_status(host, StatusCode::NickNotUnique);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        info!(%host, %nick, "nickname granted");
        ctx.reply_status(host, StatusCode::NickUnique);
        ctx.broadcast(&Message::NickRes {
            host: host.clone(),
            nick: nick.clone(),
        });
        Ok(())
    }
}

/// Handler for NICKRES: a grant announced by the root.
///
/// Applied and passed down only where the host lives in this subtree.
pub struct NickResHandler;

impl Handler for NickResHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Message::NickRes { host, nick } = msg else {
            return Ok(());
        };
        ctx.require_from_parent(msg)?;
        if ctx.directory.peer(host).is_none() {
            return Ok(());
        }

        if let Err(e) = ctx.directory.rename_peer(host, nick) {
            warn!(%host, %nick, error = %e, "cannot apply granted nickname");
        }
        ctx.deliver(host, ctx.raw.to_string())
    }
}
