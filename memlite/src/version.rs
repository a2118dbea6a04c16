pub const MEMLITE_VERSION: &str = env!("CARGO_PKG_VERSION");
