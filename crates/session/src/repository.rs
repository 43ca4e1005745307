//! The validation-result repository contract.

use time::OffsetDateTime;
use turnstile_core::{Channel, RedirectType, SecuritySettings, ValidationResult};

/// Fixed component of the repository key. Shared with the other
/// integrations of the queue service, so stored state survives a platform
/// migration.
const STORE_KEY_PREFIX: &str = "QueueITAccepted-SDFrts345E-";

/// The storage key (cookie name, session key) for one channel.
pub fn store_key(channel: &Channel) -> String {
    format!(
        "{STORE_KEY_PREFIX}{}-{}",
        channel.customer_id(),
        channel.event_id()
    )
}

/// Stores the outcome of a successful validation across requests.
///
/// Implementations must fail open: a stored record that is malformed,
/// tampered with, or expired is reported as absent, never as an error.
/// Re-verification is always safe; locking a visitor out is not.
pub trait ValidateResultRepository {
    /// The cached result for a channel, if present, intact, and unexpired.
    ///
    /// Returned results always have `is_initial_validation == false`.
    /// Implementations apply the sliding-renewal policy here.
    fn get(&mut self, channel: &Channel) -> Option<ValidationResult>;

    /// Persist an accepted result. `Enqueue` results are never cached; the
    /// call is a no-op for them. Without an explicit expiration the TTL is
    /// policy-derived from the result's redirect type.
    fn set(
        &mut self,
        channel: &Channel,
        result: &ValidationResult,
        expiration: Option<OffsetDateTime>,
    );

    /// Invalidate a previously stored result immediately.
    fn cancel(&mut self, channel: &Channel, result: &ValidationResult);
}

/// Policy-derived expiration instant for a fresh or renewed record.
pub(crate) fn policy_expiration(
    settings: &SecuritySettings,
    redirect_type: RedirectType,
    now: OffsetDateTime,
) -> OffsetDateTime {
    match redirect_type {
        RedirectType::Idle => now + settings.idle_expiration(),
        RedirectType::Disabled => now + settings.disabled_expiration(),
        _ => now + settings.cookie_expiration(),
    }
}

/// Whether a read should push the expiration forward (sliding expiration).
/// Idle and disabled passes keep their short, fixed TTL.
pub(crate) fn renewal_applies(settings: &SecuritySettings, redirect_type: RedirectType) -> bool {
    settings.extend_validity
        && !matches!(redirect_type, RedirectType::Idle | RedirectType::Disabled)
}
