//! Authentication strategies, the remote identity client and the area
//! policy engine behind the wardav gateway.

pub mod auth;
pub mod error;
pub mod identity;
