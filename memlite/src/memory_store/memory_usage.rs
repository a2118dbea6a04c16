use std::sync::Mutex;
use sysinfo::{get_current_pid, Pid, System};

/// Source of the observed process memory usage
pub trait MemoryUsage {
    /// Resident set size of the process in bytes
    fn resident_bytes(&self) -> u64;
}

pub struct ProcessMemory {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl ProcessMemory {
    pub fn new() -> ProcessMemory {
        let pid = match get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                warn!("Cannot resolve current process id: {}", err);
                None
            }
        };
        ProcessMemory {
            system: Mutex::new(System::new()),
            pid,
        }
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUsage for ProcessMemory {
    fn resident_bytes(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        let mut system = match self.system.lock() {
            Ok(system) => system,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !system.refresh_process(pid) {
            return 0;
        }
        system.process(pid).map_or(0, |process| process.memory())
    }
}
