use std::time::{SystemTime, UNIX_EPOCH};

pub trait Timer {
    /// Wall clock time in milliseconds since the Unix epoch
    fn timestamp(&self) -> u64;
}

#[derive(Default)]
pub struct SystemTimer {}

impl SystemTimer {
    pub fn new() -> Self {
        debug!("Creating system timer");
        SystemTimer {}
    }
}

impl Timer for SystemTimer {
    fn timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}
