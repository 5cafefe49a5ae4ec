//! Per-route reader and writer tasks.
//!
//! Each task owns one half of a TCP stream and reports to the manager over
//! the shared event channel, so events for one route arrive in the order
//! its bytes did.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ibrc_proto::{LineCodec, ProtocolError};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, warn};

use super::route::{CloseReason, ListenerId, Route};

/// Messages from I/O tasks to the manager.
#[derive(Debug)]
pub(super) enum IoEvent {
    Accepted(ListenerId, TcpStream, std::net::SocketAddr),
    ListenerFailed(ListenerId, std::io::Error),
    Frame(Route, String),
    Closed(Route, CloseReason),
}

pub(super) type EventSender = mpsc::UnboundedSender<IoEvent>;

fn close_reason(err: &ProtocolError) -> CloseReason {
    match err {
        ProtocolError::Io(e) => CloseReason::Transport(e.kind()),
        _ => CloseReason::Transport(std::io::ErrorKind::InvalidData),
    }
}

/// Reads frames until EOF or error, then reports the close.
pub(super) async fn read_loop(
    route: Route,
    half: OwnedReadHalf,
    codec: LineCodec,
    events: EventSender,
) {
    let mut frames = FramedRead::new(half, codec);
    let reason = loop {
        match frames.next().await {
            Some(Ok(line)) => {
                if events.send(IoEvent::Frame(route, line)).is_err() {
                    return;
                }
            }
            Some(Err(e)) => {
                warn!(%route, error = %e, "read failed");
                break close_reason(&e);
            }
            None => break CloseReason::PeerClosed,
        }
    };
    let _ = events.send(IoEvent::Closed(route, reason));
}

/// Writes queued frames in order, batching whatever is ready before each
/// flush. Ends once the queue's sender is dropped and everything queued has
/// been written, then shuts the write side down.
pub(super) async fn write_loop(
    route: Route,
    half: OwnedWriteHalf,
    codec: LineCodec,
    mut queue: mpsc::Receiver<String>,
    events: EventSender,
) {
    let mut sink = FramedWrite::new(half, codec);
    while let Some(line) = queue.recv().await {
        let mut result = sink.feed(line).await;
        while result.is_ok() {
            match queue.try_recv() {
                Ok(line) => result = sink.feed(line).await,
                Err(_) => break,
            }
        }
        if result.is_ok() {
            result = sink.flush().await;
        }
        if let Err(e) = result {
            warn!(%route, error = %e, "write failed");
            let _ = events.send(IoEvent::Closed(route, close_reason(&e)));
            return;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(%route, error = %e, "shutdown after final flush failed");
    }
}

/// Enable TCP keepalive so a silently dead peer eventually errors out.
pub(super) fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)?;
    Ok(())
}
