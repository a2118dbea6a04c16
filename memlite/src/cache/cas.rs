use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

// Seeded from the wall clock so tokens rarely repeat across restarts.
static CAS_COUNTER: LazyLock<AtomicU64> = LazyLock::new(|| {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(1, |elapsed| elapsed.as_millis() as u64);
    AtomicU64::new(millis.saturating_mul(1000))
});

/// Issues the next process-wide cas token. Every call returns a value
/// strictly greater than all previously issued tokens.
pub fn next_cas() -> u64 {
    CAS_COUNTER.fetch_add(1, Ordering::SeqCst)
}
