//! Known-user redirect URL parsing and verification.
//!
//! Turns the inbound URL of a visitor returning from the queue into a
//! verified [`turnstile_core::KnownUserToken`], or a typed error carrying
//! the original URL so the caller can send the visitor back into the queue.
//!
//! The authoritative inbound URL is supplied by the caller: if the host
//! rewrites URLs, hand this crate the URL the signature was computed over,
//! not the rewritten one.

pub mod error;
pub mod parser;

pub use error::{KnownUserError, KnownUserResult};
pub use parser::{strip_token_params, verify_md5_token};
