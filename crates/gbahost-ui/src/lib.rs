//! Headless host for `gbahost-core`: configuration, the host loop, an
//! in-memory presentation surface and a built-in test-pattern engine.

pub mod config;
pub mod host;
pub mod pattern;
pub mod surface;
