//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod http_client;
mod lock;
pub mod memory;
pub mod telemetry;
