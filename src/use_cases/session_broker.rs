use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::errors::{BrokerError, LoginFailure};
use crate::domain::ports::{Clock, VendorTransport};
use crate::domain::session::{Credentials, Session, SessionInfo, TransportMode};
use crate::domain::vendor::{ResultCode, VendorParams, VendorResponse};

// Tuning for session lifetime and forced re-authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerSettings {
    // Total data-call attempts per request, including the first.
    pub max_attempts: u32,
    // Pause between a rejected attempt and the next one.
    pub reauth_backoff: Duration,
    // Local lifetime assigned to every session; the vendor never reports one.
    pub session_ttl: Duration,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            reauth_backoff: Duration::from_secs(2),
            session_ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Holds the process-wide vendor session and attaches it to every request.
///
/// Sessions are acquired lazily on the first request, refreshed once the
/// local expiry passes, and replaced when the vendor answers with
/// [`ResultCode::SessionInvalid`]. Concurrent callers may both log in when a
/// session goes stale; the last one to finish wins the slot.
pub struct SessionBroker<T, C> {
    transport: T,
    clock: C,
    credentials: Credentials,
    settings: BrokerSettings,
    session: RwLock<Option<Arc<Session>>>,
}

impl<T, C> SessionBroker<T, C>
where
    T: VendorTransport,
    C: Clock,
{
    pub fn new(transport: T, clock: C, credentials: Credentials, settings: BrokerSettings) -> Self {
        if !credentials.is_configured() {
            tracing::error!("fleet credentials not configured; vendor logins will fail");
        }
        Self {
            transport,
            clock,
            credentials,
            settings,
            session: RwLock::new(None),
        }
    }

    /// Issue `action` with a valid session attached and return the successful response.
    ///
    /// A session-invalid answer discards the session, logs in again and
    /// retries the same call, up to `max_attempts` calls in total. Every other
    /// non-zero result code is returned as [`BrokerError::Vendor`] at once.
    #[tracing::instrument(name = "fleet_request", skip_all, fields(action = %action))]
    pub async fn request(
        &self,
        action: &str,
        params: &VendorParams,
    ) -> Result<VendorResponse, BrokerError> {
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let session = self.valid_session().await?;
            tracing::debug!(
                attempt,
                mode = %session.mode(),
                valid_for_seconds = session
                    .expires_at()
                    .saturating_sub(self.clock.now_epoch_seconds()),
                "fleet session attached"
            );

            let envelope = self
                .transport
                .call(action, params, &session)
                .await
                .map_err(|source| {
                    tracing::warn!(error = %source, "fleet data call failed");
                    BrokerError::Upstream {
                        action: action.to_string(),
                        source,
                    }
                })?;

            let response = VendorResponse::from(envelope);
            let code = response.result;
            match code {
                ResultCode::Success => return Ok(response),
                ResultCode::SessionInvalid => {
                    tracing::info!(attempt, max_attempts, "fleet session rejected; re-authenticating");
                    self.discard(&session).await;
                    if attempt < max_attempts && !self.settings.reauth_backoff.is_zero() {
                        tokio::time::sleep(self.settings.reauth_backoff).await;
                    }
                }
                code => {
                    return Err(BrokerError::Vendor {
                        action: action.to_string(),
                        code,
                    });
                }
            }
        }

        tracing::error!(attempts = max_attempts, "fleet session rejected on every attempt");
        Err(BrokerError::ExhaustedRetries {
            action: action.to_string(),
            attempts: max_attempts,
        })
    }

    // Snapshot of the held session for diagnostics; never exposes the token.
    pub async fn session_info(&self) -> Option<SessionInfo> {
        let now = self.clock.now_epoch_seconds();
        let slot = self.session.read().await;
        (*slot).as_deref().map(|session| session.info(now))
    }

    async fn valid_session(&self) -> Result<Arc<Session>, BrokerError> {
        let now = self.clock.now_epoch_seconds();
        let held = self.session.read().await.clone();
        if let Some(session) = held.filter(|session| !session.is_expired(now)) {
            return Ok(session);
        }

        // No lock is held while logging in; duplicate logins are tolerated.
        let session = Arc::new(self.authenticate().await?);
        *self.session.write().await = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn authenticate(&self) -> Result<Session, BrokerError> {
        let mut failures = Vec::new();

        for mode in TransportMode::LOGIN_ORDER {
            match self.transport.login(mode, &self.credentials).await {
                Ok(token) => {
                    let session = Session::new(
                        token,
                        mode,
                        self.clock.now_epoch_seconds(),
                        self.settings.session_ttl.as_secs(),
                    );
                    tracing::info!(%mode, expires_at = session.expires_at(), "fleet authentication successful");
                    return Ok(session);
                }
                Err(error) => {
                    tracing::warn!(%mode, %error, "fleet login variant failed");
                    failures.push(LoginFailure { mode, error });
                }
            }
        }

        tracing::error!("fleet authentication failed for every login variant");
        Err(BrokerError::Authentication { failures })
    }

    // Clear the slot only if it still holds the rejected session.
    async fn discard(&self, rejected: &Arc<Session>) {
        let mut slot = self.session.write().await;
        if matches!(&*slot, Some(held) if Arc::ptr_eq(held, rejected)) {
            *slot = None;
        }
    }
}
