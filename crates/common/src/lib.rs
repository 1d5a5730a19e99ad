//! Parallax Common Utilities
//!
//! Shared infrastructure for all Parallax crates:
//! - Error types and result aliases
//! - Capture clock for stamping asynchronous sensor events
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
