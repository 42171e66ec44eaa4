//! # Audioforge Common Library
//!
//! Shared code for the audioforge tools:
//! - Error and result types
//! - TOML configuration loading, writing and path resolution
//! - Tracing subscriber initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
