use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use memlite::memcache::cli::parser;
use memlite::memcache_server::runtime_builder::{
    create_current_thread_runtime, create_memlite_server,
};
use memlite::server::timer::SystemTimer;
use tokio_util::sync::CancellationToken;

mod params_builder;
pub use params_builder::MemliteServerParamsBuilder;

/// Server running on an ephemeral port in a background thread, stopped on drop
pub struct MemliteTestServer {
    thread_join_handle: Option<std::thread::JoinHandle<()>>,
    cancellation_token: CancellationToken,
    addr: SocketAddr,
}

impl MemliteTestServer {
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[allow(dead_code)]
    pub fn get_connection_string(&self) -> String {
        format!(
            "memcache://127.0.0.1:{}?timeout=5&tcp_nodelay=true&protocol=ascii",
            self.addr.port()
        )
    }

    #[allow(dead_code)]
    pub fn text_client(&self) -> TextClient {
        TextClient::connect(self.addr)
    }

    fn kill(&mut self) {
        self.cancellation_token.cancel();
        if let Some(thread_join_handle) = self.thread_join_handle.take() {
            if thread_join_handle.join().is_err() {
                eprintln!("Server thread panicked");
            }
        }
    }
}

impl Drop for MemliteTestServer {
    fn drop(&mut self) {
        self.kill();
    }
}

pub fn spawn_server(params: MemliteServerParamsBuilder) -> MemliteTestServer {
    let config = parser::parse(params.build()).unwrap();
    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        let runtime = create_current_thread_runtime().unwrap();
        runtime.block_on(async move {
            let mut server = create_memlite_server(&config, Arc::new(SystemTimer::new()));
            let cancellation_token = server.cancellation_token();
            let addr = server
                .start(SocketAddr::new(config.listen, 0))
                .await
                .unwrap();
            tx.send((addr, cancellation_token.clone())).unwrap();
            cancellation_token.cancelled().await;
            server.stop().await;
        });
    });
    let (addr, cancellation_token) = rx.recv().unwrap();
    MemliteTestServer {
        thread_join_handle: Some(handle),
        cancellation_token,
        addr,
    }
}

#[allow(dead_code)]
pub fn spawn_default_server() -> MemliteTestServer {
    spawn_server(MemliteServerParamsBuilder::new())
}

/// Blocking client speaking the raw text protocol
pub struct TextClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

#[allow(dead_code)]
impl TextClient {
    pub fn connect(addr: SocketAddr) -> TextClient {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.set_nodelay(true).unwrap();
        TextClient {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    pub fn send(&mut self, data: &[u8]) {
        self.writer.write_all(data).unwrap();
        self.writer.flush().unwrap();
    }

    /// Reads exactly as many bytes as `expected` holds and compares them
    pub fn expect(&mut self, expected: &str) {
        let mut buffer = vec![0u8; expected.len()];
        self.reader.read_exact(&mut buffer).unwrap();
        assert_eq!(String::from_utf8_lossy(&buffer), expected);
    }

    pub fn request(&mut self, request: &str, expected: &str) {
        self.send(request.as_bytes());
        self.expect(expected);
    }

    pub fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line
    }

    /// True once the server closed the connection
    pub fn is_closed(&mut self) -> bool {
        let mut buffer = [0u8; 1];
        matches!(self.reader.read(&mut buffer), Ok(0))
    }

    /// cas token of a stored key, read with `gets`
    pub fn cas_of(&mut self, key: &str) -> u64 {
        self.send(format!("gets {}\r\n", key).as_bytes());
        let line = self.read_line();
        let parts: Vec<&str> = line.trim_end().split(' ').collect();
        assert_eq!(parts[0], "VALUE");
        let length: usize = parts[3].parse().unwrap();
        let mut data = vec![0u8; length + 2];
        self.reader.read_exact(&mut data).unwrap();
        assert_eq!(self.read_line(), "END\r\n");
        parts[4].parse().unwrap()
    }
}
