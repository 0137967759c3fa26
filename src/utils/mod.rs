//! Utility modules
//!
//! - **error**: the crate's error type and constructors
//! - **logging**: subscriber setup for binaries

pub mod error;
pub mod logging;
