//! HTTP surface of the wardav gateway: the auth gate in front of the DAV
//! tree and the app-specific endpoints outside it.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
