//! Remote identity service client.
//!
//! ## Module Organization
//!
//! - `cache`: time-bucketed, single-flight memoization of remote calls
//! - `client`: the two-phase ticket → principal handshake
//! - `clock`: wall-clock abstraction used to compute buckets
//! - `error`: connection vs. protocol failures
//! - `principal`: `Principal` and `Ticket` types

pub mod cache;
pub mod client;
pub mod clock;
pub mod error;
pub mod principal;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::BucketCache;
pub use client::IdentityClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{IdentityError, IdentityResult};
pub use principal::{Principal, Ticket};
