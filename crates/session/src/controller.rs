//! The session validation controller.
//!
//! One call per inbound request ties the pieces together: repository
//! lookup, known-user URL verification, ticket-age enforcement, and
//! persisting the accepted result for subsequent requests.

use crate::error::{SessionValidationError, SessionValidationResult};
use crate::repository::ValidateResultRepository;
use time::OffsetDateTime;
use turnstile_core::{Channel, SecuritySettings, ValidationResult};
use turnstile_knownuser::verify_md5_token;
use url::Url;

/// Where to send a visitor who holds no valid pass.
#[derive(Clone, Debug)]
pub struct RedirectTargets {
    /// The queue's own entry URL.
    pub queue_url: Url,
    /// Optional pre-queue landing page, preferred over the queue URL.
    pub landing_page: Option<Url>,
}

impl RedirectTargets {
    /// Targets with no landing page.
    pub fn queue(queue_url: Url) -> Self {
        Self {
            queue_url,
            landing_page: None,
        }
    }

    /// The URL an unvalidated visitor is redirected to.
    pub fn redirect_url(&self) -> &Url {
        self.landing_page.as_ref().unwrap_or(&self.queue_url)
    }
}

/// Validates inbound requests against one queue and caches accepted passes.
pub struct SessionValidationController<R> {
    settings: SecuritySettings,
    repository: R,
}

impl<R: ValidateResultRepository> SessionValidationController<R> {
    /// Create a controller over a repository backend.
    pub fn new(settings: SecuritySettings, repository: R) -> Self {
        Self {
            settings,
            repository,
        }
    }

    /// The repository backend, for flushing host-side writes.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Consume the controller and return the repository.
    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Validate one inbound request URL for a channel.
    ///
    /// Order of precedence:
    /// 1. a stored result wins and is returned as a non-initial acceptance;
    /// 2. a URL without token parameters produces an [`Enqueue`] redirect;
    /// 3. a verified token is accepted, stored, and returned as the initial
    ///    acceptance, unless it is older than the configured ticket
    ///    lifetime;
    /// 4. anything else is an error carrying the channel.
    ///
    /// [`Enqueue`]: ValidationResult::Enqueue
    pub fn validate_request(
        &mut self,
        channel: &Channel,
        inbound_url: &Url,
        targets: &RedirectTargets,
    ) -> SessionValidationResult<ValidationResult> {
        self.validate_request_at(channel, inbound_url, targets, OffsetDateTime::now_utc())
    }

    fn validate_request_at(
        &mut self,
        channel: &Channel,
        inbound_url: &Url,
        targets: &RedirectTargets,
        now: OffsetDateTime,
    ) -> SessionValidationResult<ValidationResult> {
        if let Some(cached) = self.repository.get(channel) {
            tracing::debug!(%channel, "request accepted from stored validation");
            return Ok(cached);
        }

        let token = match verify_md5_token(inbound_url, &self.settings) {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!(%channel, "no token on request, redirecting to queue");
                return Ok(ValidationResult::Enqueue {
                    redirect_url: targets.redirect_url().clone(),
                });
            }
            Err(source) => {
                tracing::warn!(%channel, error = %source, "known-user verification failed");
                return Err(SessionValidationError::Invalid {
                    channel: channel.clone(),
                    source,
                });
            }
        };

        // A token issued exactly ticket_expiration ago is still accepted;
        // only strictly older ones are rejected.
        if let Some(ticket_expiration) = self.settings.ticket_expiration() {
            if token.time_stamp() < now - ticket_expiration {
                tracing::debug!(%channel, "known-user token is past the ticket lifetime");
                return Err(SessionValidationError::Expired {
                    channel: channel.clone(),
                    token: Box::new(token),
                });
            }
        }

        tracing::debug!(%channel, queue_id = %token.queue_id(), "known-user token verified");
        let result = ValidationResult::AcceptedConfirmed {
            token,
            is_initial_validation: true,
        };
        self.repository.set(channel, &result, None);
        Ok(result)
    }
}
