//! Channel identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one queue: a (customer, event) pair.
///
/// Both ids are folded to lowercase on construction. The channel is used as
/// the repository key and as part of the stored-state integrity hash, so two
/// spellings of the same ids must compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    customer_id: String,
    event_id: String,
}

impl Channel {
    /// Create a channel from customer and event ids.
    ///
    /// Returns an error if either id is empty.
    pub fn new(customer_id: &str, event_id: &str) -> crate::Result<Self> {
        if customer_id.is_empty() {
            return Err(crate::Error::InvalidChannel(
                "customer id is empty".to_string(),
            ));
        }
        if event_id.is_empty() {
            return Err(crate::Error::InvalidChannel("event id is empty".to_string()));
        }

        Ok(Self {
            customer_id: customer_id.to_lowercase(),
            event_id: event_id.to_lowercase(),
        })
    }

    /// The lowercased customer id.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// The lowercased event id.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.customer_id, self.event_id)
    }
}
