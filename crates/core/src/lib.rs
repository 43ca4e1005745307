//! Core domain types for known-user token validation.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Channel identity (customer, event)
//! - Known-user tokens and redirect types
//! - The place-in-queue obfuscation codec
//! - Validation outcomes
//! - Security settings

pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod result;
pub mod token;

pub use channel::Channel;
pub use config::SecuritySettings;
pub use error::{Error, Result};
pub use result::ValidationResult;
pub use token::{KnownUserToken, RedirectType};
