//! Integration tests module
//!
//! This module organizes all integration tests for the duckplay application.

pub mod adapter_test;
pub mod config_test;
pub mod registry_test;
pub mod service_test;
