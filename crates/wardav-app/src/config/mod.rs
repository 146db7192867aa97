pub use wardav_core::config::*;
