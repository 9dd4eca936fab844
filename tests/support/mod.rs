// In-process stand-in for the fleet vendor API, bound to an ephemeral port.
#![allow(dead_code)]

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

pub const USERNAME: &str = "dispatch";
pub const PASSWORD: &str = "secret";
// Device number the vendor reports as unknown (result code 3).
pub const MISSING_DEVICE: &str = "999";

// One data call as the vendor saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenCall {
    pub token: String,
    pub via_cookie: bool,
}

pub struct VendorState {
    query_login: AtomicBool,
    logins: AtomicUsize,
    reject_next: AtomicUsize,
    issued: Mutex<HashSet<String>>,
    seen: Mutex<Vec<SeenCall>>,
}

impl VendorState {
    fn issue(&self, prefix: &str) -> String {
        let count = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("{prefix}-{count}");
        self.issued
            .lock()
            .expect("issued mutex poisoned")
            .insert(token.clone());
        token
    }
}

pub struct FakeVendor {
    pub base_url: String,
    state: Arc<VendorState>,
}

impl FakeVendor {
    // Vendor accepting both login variants.
    pub async fn start() -> Self {
        Self::start_with(true).await
    }

    // Vendor whose GET login never returns a jsession, forcing the cookie variant.
    pub async fn start_cookie_only() -> Self {
        Self::start_with(false).await
    }

    async fn start_with(query_login: bool) -> Self {
        let state = Arc::new(VendorState {
            query_login: AtomicBool::new(query_login),
            logins: AtomicUsize::new(0),
            reject_next: AtomicUsize::new(0),
            issued: Mutex::new(HashSet::new()),
            seen: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(
                "/StandardApiAction_login.action",
                get(query_login_handler).post(cookie_login_handler),
            )
            .route(
                "/StandardApiAction_getDeviceStatus.action",
                get(device_status_handler),
            )
            .route(
                "/StandardApiAction_getDeviceByVehicle.action",
                get(device_by_vehicle_handler),
            )
            .route(
                "/StandardApiAction_queryTrackDetail.action",
                get(slow_track_handler),
            )
            .with_state(state.clone());

        // Bind to an ephemeral port to avoid collisions with local services.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral vendor port");
        let addr = listener.local_addr().expect("get local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake vendor failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    // Answer the next `count` data calls with result code 7 and revoke their tokens.
    pub fn reject_next(&self, count: usize) {
        self.state.reject_next.store(count, Ordering::SeqCst);
    }

    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenCall> {
        self.state.seen.lock().expect("seen mutex poisoned").clone()
    }
}

async fn query_login_handler(
    State(state): State<Arc<VendorState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let valid = query.get("account").map(String::as_str) == Some(USERNAME)
        && query.get("password").map(String::as_str) == Some(PASSWORD);
    if !valid {
        return Json(json!({ "result": 2 }));
    }
    if !state.query_login.load(Ordering::SeqCst) {
        return Json(json!({ "result": 0 }));
    }
    Json(json!({ "result": 0, "jsession": state.issue("q") }))
}

async fn cookie_login_handler(
    State(state): State<Arc<VendorState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let valid = form.get("username").map(String::as_str) == Some(USERNAME)
        && form.get("password").map(String::as_str) == Some(PASSWORD);
    if !valid {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let token = state.issue("c");
    (
        [(
            header::SET_COOKIE,
            format!("JSESSIONID={token}; Path=/; HttpOnly"),
        )],
        Json(json!({ "result": 0 })),
    )
        .into_response()
}

// Records the presented token; `Err` carries the reply for an invalid session.
fn check_session(
    state: &VendorState,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<(), Json<Value>> {
    let cookie_token = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("JSESSIONID="))
        .map(str::to_string);
    let (token, via_cookie) = match (query.get("jsession"), cookie_token) {
        (Some(token), _) => (token.clone(), false),
        (None, Some(token)) => (token, true),
        (None, None) => return Err(Json(json!({ "result": 7 }))),
    };

    state
        .seen
        .lock()
        .expect("seen mutex poisoned")
        .push(SeenCall {
            token: token.clone(),
            via_cookie,
        });

    let mut issued = state.issued.lock().expect("issued mutex poisoned");
    let rejected = state
        .reject_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok();
    if rejected {
        issued.remove(&token);
    }
    if rejected || !issued.contains(&token) {
        return Err(Json(json!({ "result": 7 })));
    }
    Ok(())
}

async fn device_status_handler(
    State(state): State<Arc<VendorState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    if let Err(reply) = check_session(&state, &query, &headers) {
        return reply;
    }
    let dev_idno = query.get("devIdno").cloned().unwrap_or_else(|| "111".to_string());
    if dev_idno == MISSING_DEVICE {
        return Json(json!({ "result": 3 }));
    }
    Json(json!({
        "result": 0,
        "status": [{
            "id": dev_idno,
            "vid": "KA01AB1234",
            "lat": 12971599,
            "lng": 77594566,
            "gt": "2024-05-01 08:15:00",
            "ol": 1,
            "sp": 320.0
        }]
    }))
}

async fn device_by_vehicle_handler(
    State(state): State<Arc<VendorState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    if let Err(reply) = check_session(&state, &query, &headers) {
        return reply;
    }
    Json(json!({
        "result": 0,
        "devices": [
            { "vehi_idno": "KA01AB1234", "dev_idno": "111", "device_type": 0 },
            { "vehi_idno": "KA01AB1234", "dev_idno": "112", "device_type": 1 },
            { "vehi_idno": "KA02CD5678", "dev_idno": "221", "device_type": 0 }
        ]
    }))
}

// Outlasts the client timeouts used in tests.
async fn slow_track_handler() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "result": 0, "tracks": [] }))
}
