//! Server lifecycle: bind, attach to a parent, run the event loop.

use std::net::SocketAddr;

use tracing::{Instrument, info};

use crate::config::Config;
use crate::error::StartupError;
use crate::handlers::Router;
use crate::network::{ConnectionManager, Event, Route};
use crate::telemetry::spans;

/// One server process: a listener, its routes and the routing state.
pub struct Server {
    conman: ConnectionManager,
    router: Router,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listener and, if configured, attach to the parent.
    ///
    /// Either failure is fatal.
    pub async fn bind(config: &Config) -> Result<Server, StartupError> {
        let addr = config.server.listen;
        let mut conman = ConnectionManager::new(&config.limits);
        let listener = conman
            .listen(addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })?;
        let local_addr = conman.local_addr(listener).unwrap_or(addr);

        let mut server = Server {
            conman,
            router: Router::new(config.limits.clone()),
            local_addr,
        };
        if let Some(parent) = &config.parent {
            server.connect_parent(&parent.host, parent.port).await?;
        }
        Ok(server)
    }

    /// Open the upstream route. From then on this server is not root.
    pub async fn connect_parent(&mut self, host: &str, port: u16) -> Result<Route, StartupError> {
        let route = self
            .conman
            .connect(host, port)
            .await
            .map_err(|source| StartupError::Parent {
                host: host.to_string(),
                port,
                source,
            })?;
        self.router.set_parent(route);
        info!(%route, %host, port, "attached to parent");
        Ok(route)
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_root(&self) -> bool {
        self.router.role().is_root()
    }

    /// Run the event loop until the listener fails.
    pub async fn run(mut self) -> Result<(), StartupError> {
        let span = spans::server(&self.local_addr.to_string());
        self.serve().instrument(span).await
    }

    async fn serve(&mut self) -> Result<(), StartupError> {
        info!(root = self.is_root(), "serving");
        loop {
            self.turn().await?;
        }
    }

    /// Wait for one batch of events and process it completely.
    pub async fn turn(&mut self) -> Result<(), StartupError> {
        for event in self.conman.poll_events().await {
            match event {
                Event::Acceptable(id) => while self.conman.accept(id).is_some() {},
                Event::Readable(route) => self.drain(route),
                Event::Closed(route, _) => {
                    // Frames that arrived before the close are still processed.
                    self.drain(route);
                    self.router.route_closed(route, &mut self.conman);
                    self.conman.remove(route);
                }
                Event::ListenerFailed(_, err) => return Err(StartupError::Listener(err)),
            }
        }
        Ok(())
    }

    fn drain(&mut self, route: Route) {
        while let Some(line) = self.conman.next_frame(route) {
            self.router.process(route, &line, &mut self.conman);
        }
    }
}
