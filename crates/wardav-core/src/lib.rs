//! Shared building blocks for the wardav gateway: settings, errors, route
//! constants, DAV verbs and area path normalization.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod util;
