//! Cookie access at the host boundary.
//!
//! The core never talks to a web framework. Hosts adapt their
//! request/response cookie handling to [`CookieJar`]; the in-memory
//! implementation backs tests and non-HTTP embeddings.

use std::collections::HashMap;
use time::OffsetDateTime;

/// A cookie to be written to the response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieWrite {
    /// Cookie name.
    pub name: String,
    /// Raw cookie value (already encoded).
    pub value: String,
    /// Domain scope, if configured.
    pub domain: Option<String>,
    /// Whether the cookie is hidden from client-side scripts.
    pub http_only: bool,
    /// Expiration instant.
    pub expires: OffsetDateTime,
}

/// One visitor's cookies, as seen by the current request.
pub trait CookieJar {
    /// The value of a named request cookie, if present.
    fn get(&self, name: &str) -> Option<String>;

    /// Queue a cookie write on the response, replacing any previous write
    /// of the same name.
    fn set(&mut self, cookie: CookieWrite);
}

/// In-memory jar that behaves like a cookie-respecting client: written
/// cookies become readable, and expired cookies are not returned.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: HashMap<String, CookieWrite>,
}

impl MemoryCookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last write for a named cookie, expired or not.
    pub fn written(&self, name: &str) -> Option<&CookieWrite> {
        self.cookies.get(name)
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .get(name)
            .filter(|cookie| cookie.expires > OffsetDateTime::now_utc())
            .map(|cookie| cookie.value.clone())
    }

    fn set(&mut self, cookie: CookieWrite) {
        self.cookies.insert(cookie.name.clone(), cookie);
    }
}
