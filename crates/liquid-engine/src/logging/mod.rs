//! Logger setup for binaries built on the engine.
//!
//! The library itself only talks to the `log` facade; `init_logging` wires
//! `env_logger` behind it with defaults that keep the GPU stack quiet.

mod init;

pub use init::{init_logging, LoggingConfig};
