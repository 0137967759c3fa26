//! Integration tests for turnstream-rs
//!
//! These drive whole turns through the public API: bytes in, updates out.

pub mod config_tests;
pub mod continuation_tests;
pub mod decode_tests;
pub mod transport_tests;
