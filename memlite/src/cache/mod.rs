#[allow(clippy::module_inception)]
pub mod cache;
pub mod cas;
pub mod error;
pub mod record;
