//! Session-scope request validation for queue-protected sites.
//!
//! This crate turns one-shot known-user verification into a per-visitor
//! session: the [`SessionValidationController`] checks a repository before
//! verifying the inbound URL and stores accepted passes so later requests
//! skip re-verification. Two repository backends are provided, one carried
//! in a signed visitor cookie and one held in the server session.

pub mod controller;
pub mod cookie;
pub mod error;
pub mod jar;
pub mod repository;
pub mod session;
pub mod state;

pub use controller::{RedirectTargets, SessionValidationController};
pub use cookie::CookieValidateResultRepository;
pub use error::{SessionValidationError, SessionValidationResult};
pub use jar::{CookieJar, CookieWrite, MemoryCookieJar};
pub use repository::{store_key, ValidateResultRepository};
pub use session::{MemorySessionStore, SessionStore, SessionValidateResultRepository};
pub use state::PersistedState;
