//! Common test utilities for submission-intake integration tests

#[allow(dead_code)]
pub mod fixtures;
#[allow(dead_code)]
pub mod services;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use services::*;
