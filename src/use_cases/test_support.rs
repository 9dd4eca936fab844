use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::errors::TransportError;
use crate::domain::ports::{Clock, VendorTransport};
use crate::domain::session::{Credentials, Session, TransportMode};
use crate::domain::vendor::{VendorEnvelope, VendorParams};

// Shared adjustable time source for deterministic expiry tests.
#[derive(Clone)]
pub(crate) struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub(crate) fn at(now: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub(crate) fn advance(&self, seconds: u64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// A data call as seen by the vendor.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub action: String,
    pub params: VendorParams,
    pub token: String,
    pub mode: TransportMode,
}

#[derive(Default)]
struct Script {
    query_login_error: Option<TransportError>,
    cookie_login_error: Option<TransportError>,
    responses: VecDeque<Result<Value, TransportError>>,
    fallback: Option<Value>,
    logins: Vec<TransportMode>,
    calls: Vec<RecordedCall>,
    issued: u64,
}

// Vendor stand-in that issues sequential tokens and replays queued responses.
// Once the queue is drained it answers with the fallback (or `{"result":0}`).
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_login(self, mode: TransportMode, error: TransportError) -> Self {
        {
            let mut script = self.script.lock().expect("script mutex poisoned");
            match mode {
                TransportMode::QueryParam => script.query_login_error = Some(error),
                TransportMode::CookieHeader => script.cookie_login_error = Some(error),
            }
        }
        self
    }

    pub(crate) fn with_fallback(self, body: Value) -> Self {
        self.script.lock().expect("script mutex poisoned").fallback = Some(body);
        self
    }

    pub(crate) fn push_body(&self, body: Value) {
        let mut script = self.script.lock().expect("script mutex poisoned");
        script.responses.push_back(Ok(body));
    }

    pub(crate) fn push_result(&self, code: i64) {
        self.push_body(json!({ "result": code }));
    }

    pub(crate) fn push_error(&self, error: TransportError) {
        let mut script = self.script.lock().expect("script mutex poisoned");
        script.responses.push_back(Err(error));
    }

    pub(crate) fn logins(&self) -> Vec<TransportMode> {
        self.script.lock().expect("script mutex poisoned").logins.clone()
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().expect("script mutex poisoned").calls.clone()
    }
}

#[async_trait]
impl VendorTransport for ScriptedTransport {
    async fn login(
        &self,
        mode: TransportMode,
        _credentials: &Credentials,
    ) -> Result<String, TransportError> {
        let mut script = self.script.lock().expect("script mutex poisoned");
        let failure = match mode {
            TransportMode::QueryParam => script.query_login_error.clone(),
            TransportMode::CookieHeader => script.cookie_login_error.clone(),
        };
        if let Some(error) = failure {
            return Err(error);
        }

        script.issued += 1;
        script.logins.push(mode);
        let prefix = match mode {
            TransportMode::QueryParam => "q",
            TransportMode::CookieHeader => "c",
        };
        Ok(format!("{prefix}-token-{}", script.issued))
    }

    async fn call(
        &self,
        action: &str,
        params: &VendorParams,
        session: &Session,
    ) -> Result<VendorEnvelope, TransportError> {
        let mut script = self.script.lock().expect("script mutex poisoned");
        script.calls.push(RecordedCall {
            action: action.to_string(),
            params: params.clone(),
            token: session.token().to_string(),
            mode: session.mode(),
        });

        let next = match script.responses.pop_front() {
            Some(next) => next,
            None => Ok(script
                .fallback
                .clone()
                .unwrap_or_else(|| json!({ "result": 0 }))),
        };
        let body = next?;
        serde_json::from_value(body).map_err(|err| TransportError::Decode(err.to_string()))
    }
}

pub(crate) fn params(pairs: &[(&str, &str)]) -> VendorParams {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
