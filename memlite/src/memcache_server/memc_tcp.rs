use socket2::{Domain, SockAddr, Socket, Type};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use tokio::io;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tracing::{debug, error};

use super::client_handler;
use super::server_stats::ServerStats;
use crate::memcache::store as storage;

#[derive(Clone, Copy, Debug)]
pub struct MemcacheServerConfig {
    item_size_limit: u32,
    listen_backlog: u32,
    fast: bool,
    nodelay: bool,
}

impl MemcacheServerConfig {
    pub fn new(item_size_limit: u32, listen_backlog: u32, fast: bool, nodelay: bool) -> Self {
        MemcacheServerConfig {
            item_size_limit,
            listen_backlog,
            fast,
            nodelay,
        }
    }
}

pub struct MemcacheTcpServer {
    storage: Arc<storage::MemcStore>,
    stats: Arc<ServerStats>,
    config: MemcacheServerConfig,
    cancellation_token: CancellationToken,
    accept_task: Option<JoinHandle<()>>,
}

impl MemcacheTcpServer {
    pub fn new(
        config: MemcacheServerConfig,
        storage: Arc<storage::MemcStore>,
        stats: Arc<ServerStats>,
    ) -> MemcacheTcpServer {
        MemcacheTcpServer {
            storage,
            stats,
            config,
            cancellation_token: CancellationToken::new(),
            accept_task: None,
        }
    }

    /// Token cancelling the accept loop, cancel it to make `run` return
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Binds the listener and starts accepting connections in the
    /// background. Returns the bound address, port 0 binds an ephemeral port.
    pub async fn start<A: ToSocketAddrs>(&mut self, addr: A) -> io::Result<SocketAddr> {
        if self.accept_task.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "server already started",
            ));
        }
        let listener = self.get_tcp_listener(addr)?;
        let local_addr = listener.local_addr()?;
        self.stats.set_port(local_addr.port());
        info!("Listening on: {}", local_addr);

        let accept_loop = AcceptLoop {
            listener,
            storage: Arc::clone(&self.storage),
            stats: Arc::clone(&self.stats),
            config: self.get_client_config(),
            nodelay: self.config.nodelay,
            cancellation_token: self.cancellation_token.clone(),
        };
        self.accept_task = Some(tokio::spawn(accept_loop.run()));
        Ok(local_addr)
    }

    /// Stops accepting connections and releases the port. Connections
    /// already accepted keep being served until the client closes them.
    pub async fn stop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(task) = self.accept_task.take() {
            if let Err(err) = task.await {
                error!("Accept loop failed: {}", err);
            }
        }
    }

    /// Starts the server and serves until the cancellation token is cancelled
    pub async fn run<A: ToSocketAddrs>(&mut self, addr: A) -> io::Result<()> {
        self.start(addr).await?;
        self.cancellation_token.cancelled().await;
        self.stop().await;
        Ok(())
    }

    fn get_tcp_listener<A: ToSocketAddrs>(&self, addr: A) -> Result<TcpListener, std::io::Error> {
        let socket_addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no address to listen on")
        })?;
        let socket = Socket::new(Domain::for_address(socket_addr), Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        debug!("Binding to addr: {:?}", socket_addr);
        let sock_addr = SockAddr::from(socket_addr);
        if let Err(err) = socket.bind(&sock_addr) {
            error!("Can't bind to: {:?}, err {:?}", socket_addr, err);
            return Err(err);
        }

        if let Err(err) = socket.listen(self.config.listen_backlog as i32) {
            error!("Listen error: {:?}", err);
            return Err(err);
        }

        let std_listener: std::net::TcpListener = socket.into();
        TcpListener::from_std(std_listener)
    }

    fn get_client_config(&self) -> client_handler::ClientConfig {
        client_handler::ClientConfig {
            item_size_limit: self.config.item_size_limit,
            fast: self.config.fast,
        }
    }
}

struct AcceptLoop {
    listener: TcpListener,
    storage: Arc<storage::MemcStore>,
    stats: Arc<ServerStats>,
    config: client_handler::ClientConfig,
    nodelay: bool,
    cancellation_token: CancellationToken,
}

impl AcceptLoop {
    async fn run(self) {
        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    info!("Listener stopped");
                    return;
                }
                connection = self.listener.accept() => {
                    match connection {
                        Ok((socket, peer_addr)) => {
                            if let Err(err) = socket.set_nodelay(self.nodelay) {
                                error!("Cannot set TCP_NODELAY for {}: {}", peer_addr, err);
                            }
                            let mut client = client_handler::Client::new(
                                Arc::clone(&self.storage),
                                Arc::clone(&self.stats),
                                socket,
                                peer_addr,
                                self.config,
                            );
                            // Like with other small servers, we'll `spawn` this client to ensure it
                            // runs concurrently with all other clients.
                            tokio::spawn(async move { client.handle().await });
                        }
                        Err(err) => {
                            error!("Accept error: {}", err);
                        }
                    }
                }
            }
        }
    }
}
