//! # mptag Common Library
//!
//! Shared code for the mptag bot service:
//! - Common error types
//! - Configuration loading (CLI → ENV → TOML priority chain)

pub mod config;
pub mod error;

pub use error::{Error, Result};
