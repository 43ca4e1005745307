//! Inbound redirect URL parsing and verification.

use crate::error::{KnownUserError, KnownUserResult};
use time::OffsetDateTime;
use turnstile_core::{codec, KnownUserToken, RedirectType, SecuritySettings};
use turnstile_signer::verify_url_signature;
use url::Url;
use uuid::Uuid;

/// Query-parameter names appended by the queue service, before prefixing.
const TOKEN_PARAMS: [&str; 7] = ["c", "e", "q", "p", "ts", "rt", "h"];

/// Look up one token parameter, honoring the configured prefix.
/// Empty values count as absent.
fn param(url: &Url, prefix: &str, name: &str) -> Option<String> {
    let full_name = format!("{prefix}{name}");
    url.query_pairs()
        .find(|(key, _)| key == full_name.as_str())
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// The inbound URL with every token parameter removed.
///
/// Remaining query parameters keep their relative order; values are
/// re-encoded in standard form-urlencoding.
pub fn strip_token_params(url: &Url, prefix: &str) -> Url {
    let token_names: Vec<String> = TOKEN_PARAMS
        .iter()
        .map(|name| format!("{prefix}{name}"))
        .collect();

    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !token_names.iter().any(|name| key == name.as_str()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if remaining.is_empty() {
        stripped.set_query(None);
    } else {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&remaining)
            .finish();
        stripped.set_query(Some(&query));
    }
    stripped
}

/// Parse and verify a known-user redirect URL signed with the MD5 token
/// scheme.
///
/// Returns `Ok(None)` when the URL carries no token parameters at all (the
/// visitor has simply not been through the queue). Returns a token when all
/// of queue id, place, and timestamp are present and the trailing URL
/// signature verifies. Everything in between is an error.
///
/// The signature covers the exact URL text the queue service redirected
/// to, and this function verifies `url.as_str()`. Parse the unmodified
/// redirect URL straight from the request line; a URL that has been
/// normalized, re-encoded, or rewritten by the host (changed host case,
/// stripped default port, re-ordered parameters) will fail verification
/// even though the visitor came from the queue.
pub fn verify_md5_token(
    url: &Url,
    settings: &SecuritySettings,
) -> KnownUserResult<Option<KnownUserToken>> {
    let prefix = settings.prefix();
    let original_url = strip_token_params(url, prefix);

    let queue_id_raw = param(url, prefix, "q");
    let place_raw = param(url, prefix, "p");
    let timestamp_raw = param(url, prefix, "ts");

    if queue_id_raw.is_none() && place_raw.is_none() && timestamp_raw.is_none() {
        return Ok(None);
    }

    let (Some(queue_id_raw), Some(place_raw), Some(timestamp_raw)) =
        (queue_id_raw, place_raw, timestamp_raw)
    else {
        return Err(KnownUserError::InvalidUrl { original_url });
    };

    let queue_id = Uuid::parse_str(&queue_id_raw).map_err(|_| KnownUserError::InvalidUrl {
        original_url: original_url.clone(),
    })?;

    let place_in_queue = codec::decode(&place_raw).map_err(|_| KnownUserError::InvalidUrl {
        original_url: original_url.clone(),
    })?;

    let timestamp_secs: i64 = timestamp_raw
        .parse()
        .map_err(|_| KnownUserError::InvalidUrl {
            original_url: original_url.clone(),
        })?;
    let time_stamp =
        OffsetDateTime::from_unix_timestamp(timestamp_secs).map_err(|_| {
            KnownUserError::InvalidUrl {
                original_url: original_url.clone(),
            }
        })?;

    let customer_id = param(url, prefix, "c");
    let event_id = param(url, prefix, "e");
    let redirect_type = param(url, prefix, "rt")
        .map(|value| RedirectType::parse(&value))
        .unwrap_or_default();

    verify_url_signature(url.as_str(), &settings.secret_key).map_err(|_| {
        KnownUserError::InvalidHash {
            original_url: original_url.clone(),
            validated_url: url.clone(),
        }
    })?;

    Ok(Some(KnownUserToken::new(
        queue_id,
        place_in_queue,
        time_stamp,
        customer_id,
        event_id,
        redirect_type,
        original_url,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_signer::generate_md5_hash;

    fn settings() -> SecuritySettings {
        SecuritySettings::for_testing()
    }

    fn settings_with_prefix(prefix: &str) -> SecuritySettings {
        let mut settings = SecuritySettings::for_testing();
        settings.query_string_prefix = Some(prefix.to_string());
        settings
    }

    /// Build a signed URL the way the queue service does: token parameters
    /// appended to the target URL with `h` last, the hash covering
    /// everything before it.
    fn signed_url(
        settings: &SecuritySettings,
        queue_id: Uuid,
        place: u32,
        timestamp: i64,
        redirect_type: &str,
    ) -> Url {
        let prefix = settings.prefix();
        let obfuscated = codec::encode(place);
        let unsigned = Url::parse(&format!(
            "http://q.queue-it.net/inqueue.aspx?{prefix}c=somecust&{prefix}e=someevent\
             &{prefix}q={queue_id}&{prefix}p={obfuscated}&{prefix}ts={timestamp}\
             &{prefix}rt={redirect_type}&{prefix}h="
        ))
        .unwrap();
        let hash = generate_md5_hash(unsigned.as_str(), &settings.secret_key);
        Url::parse(&format!("{unsigned}{hash}")).unwrap()
    }

    #[test]
    fn test_verify_full_token() {
        let settings = settings();
        let queue_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let url = signed_url(&settings, queue_id, 7810, timestamp, "");

        let token = verify_md5_token(&url, &settings).unwrap().unwrap();
        assert_eq!(token.queue_id(), queue_id);
        assert_eq!(token.place_in_queue(), Some(7810));
        assert_eq!(token.time_stamp().unix_timestamp(), timestamp);
        assert_eq!(token.customer_id(), Some("somecust"));
        assert_eq!(token.event_id(), Some("someevent"));
        assert_eq!(token.redirect_type(), RedirectType::Unknown);
        assert_eq!(token.original_url().as_str(), "http://q.queue-it.net/inqueue.aspx");
    }

    #[test]
    fn test_verify_with_prefix() {
        let prefixed = settings_with_prefix("prefix");
        let queue_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let url = signed_url(&prefixed, queue_id, 7810, timestamp, "queue");

        let token = verify_md5_token(&url, &prefixed).unwrap().unwrap();
        assert_eq!(token.queue_id(), queue_id);
        assert_eq!(token.redirect_type(), RedirectType::Queue);

        // Without the prefix configured, the prefixed parameters are not
        // token parameters at all.
        assert!(verify_md5_token(&url, &settings()).unwrap().is_none());
    }

    #[test]
    fn test_redirect_types() {
        let settings = settings();
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        for (wire, expected) in [
            ("queue", RedirectType::Queue),
            ("Queue", RedirectType::Queue),
            ("safetynet", RedirectType::Safetynet),
            ("afterevent", RedirectType::AfterEvent),
            ("disabled", RedirectType::Disabled),
            ("directlink", RedirectType::DirectLink),
            ("idle", RedirectType::Idle),
            ("invalidtype", RedirectType::Unknown),
        ] {
            let url = signed_url(&settings, Uuid::new_v4(), 46, timestamp, wire);
            let token = verify_md5_token(&url, &settings).unwrap().unwrap();
            assert_eq!(token.redirect_type(), expected, "rt={wire}");
        }
    }

    #[test]
    fn test_no_token_parameters_is_not_an_error() {
        let settings = settings();
        let url = Url::parse("http://example.com/target.aspx?page=2").unwrap();
        assert!(verify_md5_token(&url, &settings).unwrap().is_none());
    }

    #[test]
    fn test_partial_token_is_invalid_url() {
        let settings = settings();
        let queue_id = Uuid::new_v4();
        let obfuscated = codec::encode(7810);

        for query in [
            format!("q={queue_id}"),
            format!("p={obfuscated}"),
            "ts=1360241766".to_string(),
            format!("q={queue_id}&p={obfuscated}"),
            format!("p={obfuscated}&ts=1360241766"),
        ] {
            let url = Url::parse(&format!("http://example.com/target.aspx?{query}")).unwrap();
            let error = verify_md5_token(&url, &settings).unwrap_err();
            assert!(
                matches!(error, KnownUserError::InvalidUrl { .. }),
                "query {query}"
            );
            assert_eq!(error.original_url().as_str(), "http://example.com/target.aspx");
        }
    }

    #[test]
    fn test_unparsable_fields_are_invalid_url() {
        let settings = settings();
        let queue_id = Uuid::new_v4();
        let obfuscated = codec::encode(7810);

        // Bad queue id.
        let url = Url::parse(&format!(
            "http://example.com/?q=not-a-guid&p={obfuscated}&ts=1360241766"
        ))
        .unwrap();
        assert!(matches!(
            verify_md5_token(&url, &settings),
            Err(KnownUserError::InvalidUrl { .. })
        ));

        // Bad obfuscated place.
        let url = Url::parse(&format!(
            "http://example.com/?q={queue_id}&p=short&ts=1360241766"
        ))
        .unwrap();
        assert!(matches!(
            verify_md5_token(&url, &settings),
            Err(KnownUserError::InvalidUrl { .. })
        ));

        // Bad timestamp.
        let url = Url::parse(&format!(
            "http://example.com/?q={queue_id}&p={obfuscated}&ts=notanumber"
        ))
        .unwrap();
        assert!(matches!(
            verify_md5_token(&url, &settings),
            Err(KnownUserError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_tampered_hash_is_invalid_hash() {
        let settings = settings();
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let url = signed_url(&settings, Uuid::new_v4(), 7810, timestamp, "");

        let as_str = url.as_str();
        let last = as_str.len() - 1;
        let flipped = if &as_str[last..] == "0" { "1" } else { "0" };
        let tampered = Url::parse(&format!("{}{}", &as_str[..last], flipped)).unwrap();

        let error = verify_md5_token(&tampered, &settings).unwrap_err();
        match &error {
            KnownUserError::InvalidHash {
                original_url,
                validated_url,
            } => {
                assert_eq!(original_url.as_str(), "http://q.queue-it.net/inqueue.aspx");
                assert_eq!(validated_url, &tampered);
            }
            other => panic!("expected InvalidHash, got {other:?}"),
        }
    }

    #[test]
    fn test_original_url_preserves_other_parameters() {
        let settings = settings();
        let queue_id = Uuid::new_v4();
        let obfuscated = codec::encode(20);
        let unsigned = Url::parse(&format!(
            "http://www.example.com/buy.aspx?product=42&q={queue_id}&p={obfuscated}\
             &ts=1360241766&section=front%20row&h="
        ))
        .unwrap();
        let hash = generate_md5_hash(unsigned.as_str(), &settings.secret_key);
        let url = Url::parse(&format!("{unsigned}{hash}")).unwrap();

        let token = verify_md5_token(&url, &settings).unwrap().unwrap();
        assert_eq!(
            token.original_url().as_str(),
            "http://www.example.com/buy.aspx?product=42&section=front+row"
        );
    }

    #[test]
    fn test_strip_token_params_drops_query_when_empty() {
        let url = Url::parse("http://example.com/page?q=1&p=2&ts=3&h=4").unwrap();
        assert_eq!(strip_token_params(&url, "").as_str(), "http://example.com/page");
    }
}
