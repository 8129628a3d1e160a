//! veil-server library: session gate, connection bridge, resolver, HTTP
//! surface, and configuration. The binary in `main.rs` is a thin wrapper;
//! integration tests drive the router directly.

pub mod bridge;
pub mod config;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod server;
pub mod subscription;

pub use error::{ServerError, ServerResult};
