//! Core domain + application logic for the support web-chat client.
//!
//! This crate is intentionally transport-agnostic. The HTTP server API and
//! the thread view live behind ports (traits) implemented in adapter crates.

pub mod api;
pub mod backoff;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod render;
pub mod session;

pub use errors::{Error, Result};
