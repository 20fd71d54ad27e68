//! Common test utilities and helpers
//!
//! Shared fakes and fixtures for the integration tests. The in-crate mocks
//! are compiled only for unit tests, so these implement the public traits
//! directly.

#![allow(dead_code)]

pub mod mock_services;
pub mod test_fixtures;
