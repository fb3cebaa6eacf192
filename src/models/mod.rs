//! Data models for the session gate.

pub mod api;
pub mod credentials;
