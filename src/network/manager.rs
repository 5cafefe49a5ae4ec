//! Connection manager: owns every socket and turns their activity into
//! a single ordered stream of events for the event loop.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use ibrc_proto::LineCodec;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::Outbound;
use super::transport::{self, EventSender, IoEvent};
use super::route::{CloseReason, Event, ListenerId, Route};
use crate::config::LimitsConfig;

/// How long a removed route may take to write out what was queued.
const REMOVE_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Book-keeping for one live route.
struct RouteState {
    outbound: mpsc::Sender<String>,
    inbound: VecDeque<String>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    peer_addr: SocketAddr,
    closed: Option<CloseReason>,
}

impl RouteState {
    fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    fn abort(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

struct ListenerState {
    pending: VecDeque<(TcpStream, SocketAddr)>,
    acceptor: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// Owns the listening sockets and every route.
///
/// Reads, writes and accepts run on tokio tasks; their results are funnelled
/// through one channel and only applied to manager state inside
/// [`poll_events`](Self::poll_events), so all state changes happen on the
/// event-loop task.
pub struct ConnectionManager {
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<IoEvent>,
    routes: HashMap<Route, RouteState>,
    listeners: HashMap<ListenerId, ListenerState>,
    next_route: u64,
    next_listener: u64,
    max_line_len: usize,
    max_outbound_queue: usize,
}

impl ConnectionManager {
    /// Create an empty manager.
    pub fn new(limits: &LimitsConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx,
            routes: HashMap::new(),
            listeners: HashMap::new(),
            next_route: 1,
            next_listener: 1,
            max_line_len: limits.max_line_len,
            max_outbound_queue: limits.max_outbound_queue.max(1),
        }
    }

    /// Bind a listening socket and start accepting on it.
    pub async fn listen(&mut self, addr: SocketAddr) -> io::Result<ListenerId> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let id = ListenerId::new(self.next_listener);
        self.next_listener += 1;

        let events = self.events_tx.clone();
        let acceptor = tokio::spawn(accept_loop(id, listener, events));
        self.listeners.insert(
            id,
            ListenerState {
                pending: VecDeque::new(),
                acceptor,
                local_addr,
            },
        );
        info!(%id, addr = %local_addr, "listener bound");
        Ok(id)
    }

    /// Address a listener is bound to.
    pub fn local_addr(&self, id: ListenerId) -> Option<SocketAddr> {
        self.listeners.get(&id).map(|l| l.local_addr)
    }

    /// Open an outgoing connection. Fails without registering anything.
    pub async fn connect(&mut self, host: &str, port: u16) -> io::Result<Route> {
        let stream = TcpStream::connect((host, port)).await?;
        let peer_addr = stream.peer_addr()?;
        let route = self.register(stream, peer_addr);
        info!(%route, %host, port, "connected");
        Ok(route)
    }

    /// Take one pending connection from a listener, if any.
    pub fn accept(&mut self, id: ListenerId) -> Option<Route> {
        let (stream, addr) = self.listeners.get_mut(&id)?.pending.pop_front()?;
        let route = self.register(stream, addr);
        info!(%route, %addr, "connection accepted");
        Some(route)
    }

    fn register(&mut self, stream: TcpStream, peer_addr: SocketAddr) -> Route {
        let route = Route::new(self.next_route);
        self.next_route += 1;

        if let Err(e) = transport::enable_keepalive(&stream) {
            warn!(%route, error = %e, "failed to enable TCP keepalive");
        }
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%route, error = %e, "failed to set TCP_NODELAY");
        }

        let (read_half, write_half) = stream.into_split();
        let (outbound, queue) = mpsc::channel(self.max_outbound_queue);
        let codec = LineCodec::with_max_len(self.max_line_len);

        let reader = tokio::spawn(transport::read_loop(
            route,
            read_half,
            codec.clone(),
            self.events_tx.clone(),
        ));
        let writer = tokio::spawn(transport::write_loop(
            route,
            write_half,
            codec,
            queue,
            self.events_tx.clone(),
        ));

        self.routes.insert(
            route,
            RouteState {
                outbound,
                inbound: VecDeque::new(),
                reader,
                writer,
                peer_addr,
                closed: None,
            },
        );
        route
    }

    /// Close and forget a route.
    ///
    /// On a route that is still healthy, frames already queued are written
    /// before the socket closes, within `REMOVE_FLUSH_TIMEOUT`. A route
    /// that failed is torn down at once. Unknown routes are ignored.
    pub fn remove(&mut self, route: Route) {
        let Some(state) = self.routes.remove(&route) else {
            return;
        };
        state.reader.abort();
        debug!(%route, addr = %state.peer_addr, "route removed");

        // Dropping the queue sender lets the writer finish and shut down.
        let RouteState {
            outbound,
            mut writer,
            ..
        } = state;
        drop(outbound);
        tokio::spawn(async move {
            if timeout(REMOVE_FLUSH_TIMEOUT, &mut writer).await.is_err() {
                warn!(%route, "flush on remove timed out");
                writer.abort();
            }
        });
    }

    /// Queue a frame for sending. A no-op on unknown or closed routes.
    pub fn enqueue(&mut self, route: Route, line: impl Into<String>) {
        let Some(state) = self.routes.get(&route) else {
            return;
        };
        if state.is_closed() {
            return;
        }
        match state.outbound.try_send(line.into()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%route, limit = self.max_outbound_queue, "outbound queue full");
                let _ = self
                    .events_tx
                    .send(IoEvent::Closed(route, CloseReason::Overflow));
            }
            // The writer has already failed and reported it.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Wait for activity and return everything that is ready.
    ///
    /// Never returns an empty list.
    pub async fn poll_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while events.is_empty() {
            // The manager holds a sender, so the channel never closes.
            let Some(first) = self.events_rx.recv().await else {
                break;
            };
            self.absorb(first, &mut events);
            while let Ok(next) = self.events_rx.try_recv() {
                self.absorb(next, &mut events);
            }
        }
        events
    }

    fn absorb(&mut self, event: IoEvent, out: &mut Vec<Event>) {
        match event {
            IoEvent::Accepted(id, stream, addr) => {
                let Some(listener) = self.listeners.get_mut(&id) else {
                    return;
                };
                listener.pending.push_back((stream, addr));
                if !out.iter().any(|e| matches!(e, Event::Acceptable(l) if *l == id)) {
                    out.push(Event::Acceptable(id));
                }
            }
            IoEvent::ListenerFailed(id, err) => {
                if let Some(listener) = self.listeners.remove(&id) {
                    listener.acceptor.abort();
                    out.push(Event::ListenerFailed(id, err));
                }
            }
            IoEvent::Frame(route, line) => {
                let Some(state) = self.routes.get_mut(&route) else {
                    return;
                };
                if state.is_closed() {
                    return;
                }
                state.inbound.push_back(line);
                if !out.iter().any(|e| matches!(e, Event::Readable(r) if *r == route)) {
                    out.push(Event::Readable(route));
                }
            }
            IoEvent::Closed(route, reason) => {
                let Some(state) = self.routes.get_mut(&route) else {
                    return;
                };
                if state.is_closed() {
                    return;
                }
                state.closed = Some(reason);
                info!(%route, addr = %state.peer_addr, %reason, "route closed");
                // A failed route cannot be flushed; release the socket now.
                if reason != CloseReason::PeerClosed {
                    state.abort();
                }
                out.push(Event::Closed(route, reason));
            }
        }
    }

    /// Next buffered inbound frame on a route.
    pub fn next_frame(&mut self, route: Route) -> Option<String> {
        self.routes.get_mut(&route)?.inbound.pop_front()
    }

    /// Number of registered routes, closed-but-not-removed included.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

impl Outbound for ConnectionManager {
    fn enqueue(&mut self, route: Route, line: String) {
        ConnectionManager::enqueue(self, route, line);
    }

    fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .routes
            .iter()
            .filter(|(_, state)| !state.is_closed())
            .map(|(route, _)| *route)
            .collect();
        routes.sort();
        routes
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        for listener in self.listeners.values() {
            listener.acceptor.abort();
        }
        for state in self.routes.values() {
            state.abort();
        }
    }
}

/// Errors that only affect the connection being accepted.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

async fn accept_loop(id: ListenerId, listener: TcpListener, events: EventSender) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                if events.send(IoEvent::Accepted(id, stream, addr)).is_err() {
                    return;
                }
            }
            Err(e) if is_transient(&e) => {
                warn!(%id, error = %e, "failed to accept connection");
            }
            Err(e) => {
                error!(%id, error = %e, "listener failed");
                let _ = events.send(IoEvent::ListenerFailed(id, e));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

    async fn manager_with_listener() -> (ConnectionManager, ListenerId, SocketAddr) {
        let mut conman = ConnectionManager::new(&LimitsConfig::default());
        let id = conman.listen("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = conman.local_addr(id).unwrap();
        (conman, id, addr)
    }

    async fn poll(conman: &mut ConnectionManager) -> Vec<Event> {
        timeout(Duration::from_secs(5), conman.poll_events())
            .await
            .expect("no events within 5s")
    }

    async fn accept_one(conman: &mut ConnectionManager, id: ListenerId) -> Route {
        loop {
            if let Some(route) = conman.accept(id) {
                return route;
            }
            poll(conman).await;
        }
    }

    #[tokio::test]
    async fn frames_arrive_in_order_and_replies_go_out() {
        let (mut conman, id, addr) = manager_with_listener().await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        let route = accept_one(&mut conman, id).await;

        client.write_all(b"CONNECT a1\nNICK a1 ").await.unwrap();
        client.write_all(b"alice\r\n").await.unwrap();

        let mut frames = Vec::new();
        while frames.len() < 2 {
            for event in poll(&mut conman).await {
                if let Event::Readable(r) = event {
                    assert_eq!(r, route);
                    while let Some(frame) = conman.next_frame(route) {
                        frames.push(frame);
                    }
                }
            }
        }
        assert_eq!(frames, vec!["CONNECT a1", "NICK a1 alice"]);

        conman.enqueue(route, "STATUS a1 100");
        conman.enqueue(route, "STATUS a1 300".to_string());
        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "STATUS a1 100\n");
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "STATUS a1 300\n");
    }

    #[tokio::test]
    async fn peer_close_is_reported_once_after_its_frames() {
        let (mut conman, id, addr) = manager_with_listener().await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        let route = accept_one(&mut conman, id).await;

        client.write_all(b"QUIT a1\n").await.unwrap();
        drop(client);

        let mut closed = 0;
        let mut frames = Vec::new();
        while closed == 0 {
            for event in poll(&mut conman).await {
                match event {
                    Event::Readable(r) => {
                        while let Some(f) = conman.next_frame(r) {
                            frames.push(f);
                        }
                    }
                    Event::Closed(r, reason) => {
                        assert_eq!(r, route);
                        assert_eq!(reason, CloseReason::PeerClosed);
                        closed += 1;
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
        }
        assert_eq!(frames, vec!["QUIT a1"]);

        // Further sends are dropped silently; removal forgets the route.
        conman.enqueue(route, "STATUS a1 200");
        conman.remove(route);
        conman.remove(route);
        assert_eq!(conman.route_count(), 0);
        assert!(conman.next_frame(route).is_none());
    }

    #[tokio::test]
    async fn remove_flushes_queued_frames_then_closes() {
        let (mut conman, id, addr) = manager_with_listener().await;
        let client = TcpStream::connect(addr).await.unwrap();
        let route = accept_one(&mut conman, id).await;

        conman.enqueue(route, "STATUS a1 200");
        conman.remove(route);

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "STATUS a1 200\n");
        line.clear();
        assert_eq!(reader.read_line(&mut line).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn connect_failure_registers_nothing() {
        let (mut conman, _id, _addr) = manager_with_listener().await;
        let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = unused.local_addr().unwrap().port();
        drop(unused);

        assert!(conman.connect("127.0.0.1", port).await.is_err());
        assert_eq!(conman.route_count(), 0);
    }

    #[tokio::test]
    async fn routes_are_never_reused() {
        let (mut conman, id, addr) = manager_with_listener().await;
        let _a = TcpStream::connect(addr).await.unwrap();
        let first = accept_one(&mut conman, id).await;
        conman.remove(first);

        let _b = TcpStream::connect(addr).await.unwrap();
        let second = accept_one(&mut conman, id).await;
        assert!(second > first);
        assert_eq!(Outbound::routes(&conman), vec![second]);
    }

    #[tokio::test]
    async fn overflow_closes_the_route() {
        let limits = LimitsConfig {
            max_outbound_queue: 2,
            ..LimitsConfig::default()
        };
        let mut conman = ConnectionManager::new(&limits);
        let id = conman.listen("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = conman.local_addr(id).unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let route = accept_one(&mut conman, id).await;

        // The writer task has not run yet on this single-threaded runtime,
        // so nothing drains the queue between these calls.
        for _ in 0..3 {
            conman.enqueue(route, "MSG a1 alice lobby flood");
        }

        let events = poll(&mut conman).await;
        assert!(
            events
                .iter()
                .any(|e| matches!(e, Event::Closed(r, CloseReason::Overflow) if *r == route))
        );

        // The peer never reads, yet the socket is released without waiting
        // for a flush.
        let mut rest = Vec::new();
        let _ = timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
            .await
            .expect("overflowed route still open");
        conman.remove(route);
        assert_eq!(conman.route_count(), 0);
    }

    #[tokio::test]
    async fn overflow_with_unread_large_frames_releases_the_socket() {
        let limits = LimitsConfig {
            max_outbound_queue: 4,
            ..LimitsConfig::default()
        };
        let mut conman = ConnectionManager::new(&limits);
        let id = conman.listen("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = conman.local_addr(id).unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let route = accept_one(&mut conman, id).await;

        // Fill the kernel buffers until the writer blocks and the queue backs up.
        let frame = format!("MSG a1 alice lobby {}", "x".repeat(64 * 1024));
        let overflowed = timeout(Duration::from_secs(20), async {
            loop {
                conman.enqueue(route, frame.clone());
                tokio::task::yield_now().await;
                if let Ok(events) = timeout(Duration::from_millis(1), conman.poll_events()).await {
                    if events
                        .iter()
                        .any(|e| matches!(e, Event::Closed(r, CloseReason::Overflow) if *r == route))
                    {
                        return;
                    }
                }
            }
        })
        .await;
        assert!(overflowed.is_ok(), "queue never overflowed");
        conman.remove(route);

        let mut rest = Vec::new();
        let _ = timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
            .await
            .expect("removed route still open");
    }
}
