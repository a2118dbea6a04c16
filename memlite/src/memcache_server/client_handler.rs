use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io;
use tokio::net::TcpStream;
use tracing::{debug, error};

use super::handler;
use super::server_stats::ServerStats;
use crate::memcache::store as storage;
use crate::protocol::text::connection::MemcacheTextConnection;
use crate::protocol::text::decoder::{MemcacheTextDecoder, TextRequest};

#[derive(Clone, Copy)]
pub struct ClientConfig {
    pub(crate) item_size_limit: u32,
    pub(crate) fast: bool,
}

pub struct Client {
    stream: MemcacheTextConnection,
    addr: SocketAddr,
    handler: handler::TextHandler,
    storage: Arc<storage::MemcStore>,
    /// Connection counters, the connection is accounted as closed on drop
    stats: Arc<ServerStats>,
}

impl Client {
    pub fn new(
        store: Arc<storage::MemcStore>,
        stats: Arc<ServerStats>,
        socket: TcpStream,
        addr: SocketAddr,
        config: ClientConfig,
    ) -> Self {
        stats.connection_opened();
        let decoder = MemcacheTextDecoder::new(config.item_size_limit).with_fast_mode(config.fast);
        Client {
            stream: MemcacheTextConnection::new(socket, decoder),
            addr,
            handler: handler::TextHandler::new(store.clone(), stats.clone()),
            storage: store,
            stats,
        }
    }

    pub async fn handle(&mut self) {
        info!("New client connected: {}", self.addr);

        // Requests are handled one at a time in the order they were sent,
        // pipelined requests already buffered are decoded before reading again.
        loop {
            let req_or_none = self.stream.read_frame().await;
            let client_close = self.handle_frame(req_or_none).await;
            if client_close {
                return;
            }
        }
    }

    async fn handle_frame(&mut self, req: Result<Option<TextRequest>, io::Error>) -> bool {
        match req {
            Ok(re) => {
                match re {
                    Some(request) => self.handle_request(request).await,
                    None => {
                        // The connection will be closed at this point as `read_frame()` has returned `None`.
                        debug!("Connection closed: {}", self.addr);
                        true
                    }
                }
            }
            Err(err) => {
                log_error(err);
                true
            }
        }
    }

    /// Handles single memcached text request
    /// Returns true if we should leave client receive loop
    async fn handle_request(&mut self, request: TextRequest) -> bool {
        if request.closes_connection() {
            debug!("Closing client socket: {:?}", request);
            if let Err(_e) = self.stream.shutdown().await.map_err(log_error) {}
            return true;
        }

        let resp = self.handler.handle_request(request);
        // runs before the next await so purge never interleaves with a command
        self.storage.run_pending_tasks();

        match resp {
            Some(response) => {
                if let Err(e) = self.stream.write(&response).await {
                    error!("error on sending response; error = {:?}", e);
                    return true;
                }
                false
            }
            None => false,
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Done in `Drop` so the connection is accounted for even if the
        // task handling it panics.
        self.stats.connection_closed();
    }
}

fn log_error(e: io::Error) {
    // in most cases its not an error
    // client may just drop connection
    if e.kind() == io::ErrorKind::NotConnected || e.kind() == io::ErrorKind::ConnectionReset {
        info!("Error: {}", e);
    } else {
        error!("Error: {}", e);
    }
}
