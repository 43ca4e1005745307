//! Cookie-backed validation-result repository. This is the default backend:
//! all state travels with the visitor, so no cross-server coordination is
//! needed.
//!
//! The record is one HTTP-only cookie per channel, its value a
//! form-urlencoded field set plus a keyed SHA-256 integrity hash. The
//! client holds the cookie, so the hash is what makes the stored state
//! trustworthy; any mismatch is treated as a cache miss.

use crate::jar::{CookieJar, CookieWrite};
use crate::repository::{policy_expiration, renewal_applies, store_key, ValidateResultRepository};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use turnstile_core::{codec, Channel, KnownUserToken, RedirectType, SecuritySettings, ValidationResult};
use url::Url;
use uuid::Uuid;

const FIELD_QUEUE_ID: &str = "QueueId";
const FIELD_ORIGINAL_URL: &str = "OriginalUrl";
const FIELD_PLACE_IN_QUEUE: &str = "PlaceInQueue";
const FIELD_REDIRECT_TYPE: &str = "RedirectType";
const FIELD_TIME_STAMP: &str = "TimeStamp";
const FIELD_HASH: &str = "Hash";
const FIELD_EXPIRES: &str = "Expires";

/// Repository storing validation results in a signed visitor cookie.
pub struct CookieValidateResultRepository<J> {
    jar: J,
    settings: SecuritySettings,
}

impl<J: CookieJar> CookieValidateResultRepository<J> {
    /// Create a repository over the current request's cookie jar.
    pub fn new(jar: J, settings: SecuritySettings) -> Self {
        Self { jar, settings }
    }

    /// The underlying jar, for flushing queued writes to the response.
    pub fn jar(&self) -> &J {
        &self.jar
    }

    /// Consume the repository and return the jar.
    pub fn into_jar(self) -> J {
        self.jar
    }

    /// Keyed integrity hash over every stored field plus the expiration.
    fn integrity_hash(
        &self,
        queue_id: &str,
        original_url: &str,
        place_in_queue: u32,
        redirect_type: &str,
        time_stamp: &str,
        expires: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(queue_id.as_bytes());
        hasher.update(original_url.as_bytes());
        hasher.update(place_in_queue.to_string().as_bytes());
        hasher.update(redirect_type.as_bytes());
        hasher.update(time_stamp.as_bytes());
        hasher.update(expires.as_bytes());
        hasher.update(self.settings.secret_key.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Decode and authenticate a stored cookie value. `None` for anything
    /// not worth trusting: missing fields, expiry, bad hash, unparsable
    /// contents. All of it means "re-verify the visitor".
    fn decode_cookie(&self, channel: &Channel, raw: &str) -> Option<KnownUserToken> {
        let fields: HashMap<String, String> = url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();

        let expires_raw = fields.get(FIELD_EXPIRES)?;
        let expiration = OffsetDateTime::parse(expires_raw, &Rfc3339).ok()?;
        if expiration < OffsetDateTime::now_utc() {
            tracing::debug!(%channel, "validation cookie expired");
            return None;
        }

        let queue_id_raw = fields.get(FIELD_QUEUE_ID)?;
        let original_url_raw = fields.get(FIELD_ORIGINAL_URL)?;
        let time_stamp_raw = fields.get(FIELD_TIME_STAMP)?;
        let place_in_queue = codec::decode(fields.get(FIELD_PLACE_IN_QUEUE)?).ok()?;
        let redirect_type = RedirectType::parse(fields.get(FIELD_REDIRECT_TYPE)?);

        let expected_hash = self.integrity_hash(
            queue_id_raw,
            original_url_raw,
            place_in_queue,
            redirect_type.as_str(),
            time_stamp_raw,
            expires_raw,
        );
        if fields.get(FIELD_HASH) != Some(&expected_hash) {
            tracing::warn!(%channel, "validation cookie integrity hash mismatch");
            return None;
        }

        let queue_id = Uuid::parse_str(queue_id_raw).ok()?;
        let time_stamp =
            OffsetDateTime::from_unix_timestamp(time_stamp_raw.parse().ok()?).ok()?;
        let original_url = Url::parse(original_url_raw).ok()?;

        Some(KnownUserToken::new(
            queue_id,
            place_in_queue,
            time_stamp,
            Some(channel.customer_id().to_string()),
            Some(channel.event_id().to_string()),
            redirect_type,
            original_url,
        ))
    }

    fn write_cookie(&mut self, channel: &Channel, token: &KnownUserToken, expiration: OffsetDateTime) {
        let place_in_queue = token.place_in_queue().unwrap_or(0);
        let time_stamp = token.time_stamp().unix_timestamp().to_string();
        let expires_raw = expiration.format(&Rfc3339).unwrap_or_default();

        let hash = self.integrity_hash(
            &token.queue_id().to_string(),
            token.original_url().as_str(),
            place_in_queue,
            token.redirect_type().as_str(),
            &time_stamp,
            &expires_raw,
        );

        let value = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(FIELD_QUEUE_ID, &token.queue_id().to_string())
            .append_pair(FIELD_ORIGINAL_URL, token.original_url().as_str())
            .append_pair(FIELD_PLACE_IN_QUEUE, &codec::encode(place_in_queue))
            .append_pair(FIELD_REDIRECT_TYPE, token.redirect_type().as_str())
            .append_pair(FIELD_TIME_STAMP, &time_stamp)
            .append_pair(FIELD_HASH, &hash)
            .append_pair(FIELD_EXPIRES, &expires_raw)
            .finish();

        self.jar.set(CookieWrite {
            name: store_key(channel),
            value,
            domain: self.settings.cookie_domain.clone(),
            http_only: true,
            expires: expiration,
        });
    }
}

impl<J: CookieJar> ValidateResultRepository for CookieValidateResultRepository<J> {
    fn get(&mut self, channel: &Channel) -> Option<ValidationResult> {
        let raw = self.jar.get(&store_key(channel))?;
        let token = self.decode_cookie(channel, &raw)?;

        if renewal_applies(&self.settings, token.redirect_type()) {
            let renewed = OffsetDateTime::now_utc() + self.settings.cookie_expiration();
            self.write_cookie(channel, &token, renewed);
        }

        Some(ValidationResult::AcceptedConfirmed {
            token,
            is_initial_validation: false,
        })
    }

    fn set(
        &mut self,
        channel: &Channel,
        result: &ValidationResult,
        expiration: Option<OffsetDateTime>,
    ) {
        let ValidationResult::AcceptedConfirmed { token, .. } = result else {
            return;
        };

        let expiration = expiration.unwrap_or_else(|| {
            policy_expiration(
                &self.settings,
                token.redirect_type(),
                OffsetDateTime::now_utc(),
            )
        });
        self.write_cookie(channel, token, expiration);
    }

    fn cancel(&mut self, channel: &Channel, result: &ValidationResult) {
        // Back-dating both the cookie and its Expires field invalidates the
        // record even on clients that keep expired cookies around.
        self.set(
            channel,
            result,
            Some(OffsetDateTime::now_utc() - Duration::days(1)),
        );
    }
}
