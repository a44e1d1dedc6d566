//! Core types for the eswrap search client
//!
//! This crate provides the pieces shared by the client and the CLI:
//!
//! - **Sort values**: precision-safe `search_after` cursors ([`sort`])
//! - **Configuration**: cluster connection settings and stored scripts
//! - **Error handling**: unified setup/configuration error types
//!

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod sort;

// Re-export main types for convenience
pub use config::{ClientConfig, Config, ScriptsConfig};
pub use error::{Error, Result, ResultExt};
pub use sort::{SortDecodeError, SortKind, SortSchema, SortValue, SortValueKind, SortValues};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
    pub use crate::sort::{SortSchema, SortValue, SortValues};
}
