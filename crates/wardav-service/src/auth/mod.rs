//! Authentication and authorization flow.
//!
//! ## Module Organization
//!
//! - `backend`: the strategy family selected at startup (`AuthBackend`)
//! - `database`: credential validation against an external `CredentialStore`
//! - `decision`: request, decision and outcome types shared by all strategies
//! - `delegated`: remote identity service + area policy
//! - `local`: in-process username/password table
//! - `password`: Argon2 hashing and verification
//! - `policy`: area policy engine for delegated principals

pub mod backend;
pub mod database;
pub mod decision;
pub mod delegated;
pub mod local;
pub mod password;
pub mod policy;

pub use backend::AuthBackend;
pub use database::{CredentialStore, DatabaseBackend, StoreConnector};
pub use decision::{AuthDecision, AuthOutcome, AuthRequest, DenyReason};
pub use delegated::DelegatedBackend;
pub use local::LocalTableBackend;
pub use policy::{AreaPolicy, parse_destination};
