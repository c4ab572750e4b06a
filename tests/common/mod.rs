//! Common test utilities for yt-smpl integration tests

pub mod fakes;
pub mod fixtures;

pub use fakes::*;
pub use fixtures::*;
