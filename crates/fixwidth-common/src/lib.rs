//! Fixwidth Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error types and logging setup for the fixwidth workspace.
//!
//! - **Error Handling**: [`FixwidthError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber configuration, see [`logging`]
//!
//! # Example
//!
//! ```no_run
//! use fixwidth_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("worker starting");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{FixwidthError, Result};
