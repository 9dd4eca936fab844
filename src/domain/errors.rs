use crate::domain::session::TransportMode;
use crate::domain::vendor::ResultCode;

// Failures of a single HTTP exchange with the vendor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("response decode error: {0}")]
    Decode(String),
    #[error("no session token in login response")]
    MissingToken,
    #[error("vendor rejected login: {0}")]
    LoginRejected(ResultCode),
    #[error("invalid vendor url: {0}")]
    InvalidUrl(String),
}

// One login variant that did not produce a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{mode} login: {error}")]
pub struct LoginFailure {
    pub mode: TransportMode,
    pub error: TransportError,
}

// Errors surfaced by the session broker to its callers.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    // Neither login variant yielded a session.
    #[error("fleet authentication failed: {}", describe_failures(.failures))]
    Authentication { failures: Vec<LoginFailure> },

    // Transport-level failure on a data call, unrelated to the session.
    #[error("fleet upstream error ({action}): {source}")]
    Upstream {
        action: String,
        #[source]
        source: TransportError,
    },

    // The vendor kept rejecting fresh sessions until the budget ran out.
    #[error("fleet session rejected on all {attempts} attempts ({action})")]
    ExhaustedRetries { action: String, attempts: u32 },

    // Any other non-zero result code, returned on first sight.
    #[error("fleet vendor error ({action}): {code}")]
    Vendor { action: String, code: ResultCode },
}

impl BrokerError {
    pub fn vendor_code(&self) -> Option<ResultCode> {
        match self {
            BrokerError::Vendor { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn describe_failures(failures: &[LoginFailure]) -> String {
    if failures.is_empty() {
        return "no login variant attempted".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// Errors surfaced by the typed fleet operations.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("malformed fleet payload ({action}): {reason}")]
    MalformedPayload { action: &'static str, reason: String },
}
