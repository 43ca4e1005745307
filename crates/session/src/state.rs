//! Persisted validation state.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use turnstile_core::{Channel, KnownUserToken, RedirectType};
use url::Url;
use uuid::Uuid;

/// The stored shape of one accepted validation.
///
/// This is what survives between requests: enough to rebuild the token on a
/// cache hit, plus the record's own expiration. The integrity hash used by
/// the cookie backend is not part of this struct; it wraps the stored
/// record, it is not state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// The queue id of the verified token.
    pub queue_id: Uuid,
    /// The visitor's target URL, token parameters stripped.
    pub original_url: Url,
    /// Issue time of the token as epoch seconds (the wire `ts` value).
    pub time_stamp_secs: i64,
    /// How the visitor was redirected.
    pub redirect_type: RedirectType,
    /// Raw place in queue; 0 when unknown.
    pub place_in_queue: u32,
    /// When this record stops being valid. `None` means no expiry check
    /// (legacy records only; every record this crate writes has one).
    #[serde(with = "time::serde::rfc3339::option")]
    pub expiration: Option<OffsetDateTime>,
}

impl PersistedState {
    /// Capture a verified token for storage.
    pub fn from_token(token: &KnownUserToken, expiration: OffsetDateTime) -> Self {
        Self {
            queue_id: token.queue_id(),
            original_url: token.original_url().clone(),
            time_stamp_secs: token.time_stamp().unix_timestamp(),
            redirect_type: token.redirect_type(),
            place_in_queue: token.place_in_queue().unwrap_or(0),
            expiration: Some(expiration),
        }
    }

    /// Rebuild the token for a cache hit. `None` when the stored timestamp
    /// is out of range (corrupt record).
    pub fn to_token(&self, channel: &Channel) -> Option<KnownUserToken> {
        let time_stamp = OffsetDateTime::from_unix_timestamp(self.time_stamp_secs).ok()?;
        Some(KnownUserToken::new(
            self.queue_id,
            self.place_in_queue,
            time_stamp,
            Some(channel.customer_id().to_string()),
            Some(channel.event_id().to_string()),
            self.redirect_type,
            self.original_url.clone(),
        ))
    }

    /// Whether the record has expired as of `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        matches!(self.expiration, Some(expiration) if expiration < now)
    }
}
