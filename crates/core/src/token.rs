//! Known-user token types.

use crate::codec::MAX_PLACE;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

/// How the visitor was redirected to the target URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectType {
    /// Unable to determine the redirect type.
    #[default]
    Unknown,
    /// Redirected by the queue itself.
    Queue,
    /// Redirected by the safety net.
    Safetynet,
    /// Redirected after the event had ended.
    AfterEvent,
    /// Redirected while the queue was disabled.
    Disabled,
    /// Redirected via a direct link, bypassing the queue.
    DirectLink,
    /// Redirected while the queue was idle.
    Idle,
}

impl RedirectType {
    /// Parse a wire value, case-insensitively.
    ///
    /// Unrecognized or empty values map to [`RedirectType::Unknown`]; this is
    /// never an error, so new redirect types added by the remote service do
    /// not break older deployments.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "queue" => Self::Queue,
            "safetynet" => Self::Safetynet,
            "afterevent" => Self::AfterEvent,
            "disabled" => Self::Disabled,
            "directlink" => Self::DirectLink,
            "idle" => Self::Idle,
            _ => Self::Unknown,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Queue => "queue",
            Self::Safetynet => "safetynet",
            Self::AfterEvent => "afterevent",
            Self::Disabled => "disabled",
            Self::DirectLink => "directlink",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for RedirectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A verified known-user token.
///
/// Produced only by successful signature verification; immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownUserToken {
    queue_id: Uuid,
    place_in_queue: Option<u32>,
    time_stamp: OffsetDateTime,
    customer_id: Option<String>,
    event_id: Option<String>,
    redirect_type: RedirectType,
    original_url: Url,
}

impl KnownUserToken {
    /// Construct a token from verified wire values.
    ///
    /// The place in queue collapses to `None` when it is zero or at/above
    /// the service's "unknown/disabled" sentinel (9,999,999).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue_id: Uuid,
        place_in_queue: u32,
        time_stamp: OffsetDateTime,
        customer_id: Option<String>,
        event_id: Option<String>,
        redirect_type: RedirectType,
        original_url: Url,
    ) -> Self {
        let place_in_queue = if place_in_queue == 0 || place_in_queue >= MAX_PLACE {
            None
        } else {
            Some(place_in_queue)
        };

        Self {
            queue_id,
            place_in_queue,
            time_stamp,
            customer_id,
            event_id,
            redirect_type,
            original_url,
        }
    }

    /// The 128-bit queue identifier. Nil means the queue was disabled.
    pub fn queue_id(&self) -> Uuid {
        self.queue_id
    }

    /// The visitor's position in the queue, if known.
    pub fn place_in_queue(&self) -> Option<u32> {
        self.place_in_queue
    }

    /// UTC instant the token was issued.
    pub fn time_stamp(&self) -> OffsetDateTime {
        self.time_stamp
    }

    /// Customer id carried in the token, if any.
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Event id carried in the token, if any.
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    /// How the visitor arrived at the target URL.
    pub fn redirect_type(&self) -> RedirectType {
        self.redirect_type
    }

    /// The target URL with all token parameters stripped.
    pub fn original_url(&self) -> &Url {
        &self.original_url
    }

    /// Whether the token was issued while the queue was disabled.
    pub fn is_queue_disabled(&self) -> bool {
        self.queue_id.is_nil()
    }
}
