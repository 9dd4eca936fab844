use serde::Serialize;
use std::fmt;

// How the vendor session token rides along on data calls.
// Decided once per session by whichever login variant succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    // `jsession` query parameter; issued in the GET login response body.
    QueryParam,
    // `Cookie: JSESSIONID=...`; issued via Set-Cookie on the POST login.
    CookieHeader,
}

impl TransportMode {
    // Login variants in the order they are attempted.
    pub const LOGIN_ORDER: [TransportMode; 2] =
        [TransportMode::QueryParam, TransportMode::CookieHeader];
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::QueryParam => write!(f, "query_param"),
            TransportMode::CookieHeader => write!(f, "cookie_header"),
        }
    }
}

// Vendor session held by the broker. Replaced wholesale, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    mode: TransportMode,
    issued_at: u64,
    expires_at: u64,
}

impl Session {
    pub fn new(token: String, mode: TransportMode, issued_at: u64, ttl_seconds: u64) -> Self {
        Self {
            token,
            mode,
            issued_at,
            expires_at: issued_at.saturating_add(ttl_seconds),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn is_expired(&self, now_epoch_seconds: u64) -> bool {
        now_epoch_seconds >= self.expires_at
    }

    // Token-free view for diagnostics endpoints.
    pub fn info(&self, now_epoch_seconds: u64) -> SessionInfo {
        SessionInfo {
            mode: self.mode,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            is_valid: !self.is_expired(now_epoch_seconds),
        }
    }
}

// Tokens must never reach logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("mode", &self.mode)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub mode: TransportMode,
    pub issued_at: u64,
    pub expires_at: u64,
    pub is_valid: bool,
}

// Vendor account used for every login.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
