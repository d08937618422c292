//! Shared utilities for Hiroba packages.
//!
//! - `logger`: tracing subscriber bootstrap
//! - `time`: clock abstraction and timestamp helpers

pub mod logger;
pub mod time;
