use crate::memcache::store::MemcStore;
use crate::memory_store::memory_usage::MemoryUsage;
use crate::protocol::text::network::StatsResponse;
use crate::server::timer;
use crate::version::MEMLITE_VERSION;
use std::process;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;

const BYTES_IN_MB: u64 = 1024 * 1024;

/// Process wide counters reported by `stats`
pub struct ServerStats {
    started_at: u64,
    port: AtomicU16,
    max_bytes: u64,
    evictions: bool,
    curr_connections: AtomicU64,
    total_connections: AtomicU64,
    timer: Arc<dyn timer::Timer + Send + Sync>,
    memory: Arc<dyn MemoryUsage + Send + Sync>,
}

impl ServerStats {
    pub fn new(
        timer: Arc<dyn timer::Timer + Send + Sync>,
        memory: Arc<dyn MemoryUsage + Send + Sync>,
        max_size_mb: Option<u64>,
        evictions: bool,
    ) -> ServerStats {
        ServerStats {
            started_at: timer.timestamp(),
            port: AtomicU16::new(0),
            max_bytes: max_size_mb.map_or(0, |mb| mb.saturating_mul(BYTES_IN_MB)),
            evictions,
            curr_connections: AtomicU64::new(0),
            total_connections: AtomicU64::new(0),
            timer,
            memory,
        }
    }

    pub fn set_port(&self, port: u16) {
        self.port.store(port, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.curr_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .curr_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(1)
            });
    }

    pub fn curr_connections(&self) -> u64 {
        self.curr_connections.load(Ordering::Relaxed)
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Snapshot in the order the `stats` command reports it
    pub fn snapshot(&self, storage: &MemcStore) -> StatsResponse {
        let now = self.timer.timestamp();
        let uptime = now.saturating_sub(self.started_at) / 1000;
        let evictions = if self.evictions { "on" } else { "off" };
        StatsResponse {
            stats: vec![
                ("pid", process::id().to_string()),
                ("uptime", uptime.to_string()),
                ("time", (now / 1000).to_string()),
                ("version", String::from(MEMLITE_VERSION)),
                ("curr_items", storage.size().to_string()),
                ("total_items", storage.total_items().to_string()),
                ("bytes", self.memory.resident_bytes().to_string()),
                ("max_bytes", self.max_bytes.to_string()),
                ("tcpport", self.port.load(Ordering::Relaxed).to_string()),
                ("num_threads", String::from("1")),
                ("curr_connections", self.curr_connections().to_string()),
                ("total_connections", self.total_connections().to_string()),
                ("cas_enabled", String::from("yes")),
                ("evictions", String::from(evictions)),
            ],
        }
    }
}
