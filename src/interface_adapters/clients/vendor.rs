use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::domain::errors::TransportError;
use crate::domain::ports::VendorTransport;
use crate::domain::session::{Credentials, Session, TransportMode};
use crate::domain::vendor::{ResultCode, VendorEnvelope, VendorParams};

pub const LOGIN_ACTION: &str = "StandardApiAction_login.action";

const SESSION_COOKIE: &str = "JSESSIONID";
const SESSION_PARAM: &str = "jsession";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Body of the GET login.
#[derive(Debug, Deserialize)]
struct QueryLoginBody {
    #[serde(default)]
    result: Option<i64>,
    #[serde(default)]
    jsession: Option<String>,
}

impl QueryLoginBody {
    // A non-zero `result` without a token names the vendor's reason.
    fn into_token(self) -> Result<String, TransportError> {
        if let Some(token) = self.jsession.filter(|token| !token.is_empty()) {
            return Ok(token);
        }
        match self.result.map(ResultCode::from_code) {
            Some(code) if !code.is_success() => Err(TransportError::LoginRejected(code)),
            _ => Err(TransportError::MissingToken),
        }
    }
}

// Thin reqwest client for the fleet vendor API. Holds no session state.
#[derive(Clone)]
pub struct VendorHttpClient {
    http: Client,
    base_url: String,
}

impl VendorHttpClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn action_url(&self, action: &str) -> Result<Url, TransportError> {
        Url::parse(&format!("{}/{}", self.base_url, action))
            .map_err(|err| TransportError::InvalidUrl(err.to_string()))
    }

    // GET login; the token comes back as `jsession` in the JSON body.
    async fn login_with_query(&self, credentials: &Credentials) -> Result<String, TransportError> {
        let mut url = self.action_url(LOGIN_ACTION)?;
        url.query_pairs_mut()
            .append_pair("account", &credentials.username)
            .append_pair("password", &credentials.password);

        let res = self.http.get(url).send().await.map_err(send_error)?;
        let res = ensure_success(res)?;
        let body = res
            .json::<QueryLoginBody>()
            .await
            .map_err(|err| TransportError::Decode(err.without_url().to_string()))?;

        body.into_token()
    }

    // Form POST login; the token comes back in a JSESSIONID Set-Cookie.
    async fn login_with_cookie(&self, credentials: &Credentials) -> Result<String, TransportError> {
        let url = self.action_url(LOGIN_ACTION)?;
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &credentials.username)
            .append_pair("password", &credentials.password)
            .finish();

        let res = self
            .http
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form)
            .send()
            .await
            .map_err(send_error)?;
        let res = ensure_success(res)?;

        session_cookie(res.headers()).ok_or(TransportError::MissingToken)
    }
}

#[async_trait]
impl VendorTransport for VendorHttpClient {
    async fn login(
        &self,
        mode: TransportMode,
        credentials: &Credentials,
    ) -> Result<String, TransportError> {
        match mode {
            TransportMode::QueryParam => self.login_with_query(credentials).await,
            TransportMode::CookieHeader => self.login_with_cookie(credentials).await,
        }
    }

    async fn call(
        &self,
        action: &str,
        params: &VendorParams,
        session: &Session,
    ) -> Result<VendorEnvelope, TransportError> {
        let mut url = self.action_url(action)?;
        let attach_query = session.mode() == TransportMode::QueryParam;
        if !params.is_empty() || attach_query {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if attach_query {
                query.append_pair(SESSION_PARAM, session.token());
            }
        }

        let mut req = self.http.get(url);
        if session.mode() == TransportMode::CookieHeader {
            req = req.header(COOKIE, format!("{SESSION_COOKIE}={}", session.token()));
        }

        tracing::debug!(action, mode = %session.mode(), "calling fleet vendor");
        let res = req.send().await.map_err(send_error)?;
        let res = ensure_success(res)?;

        res.json::<VendorEnvelope>()
            .await
            .map_err(|err| TransportError::Decode(err.without_url().to_string()))
    }
}

// Request URLs carry credentials or tokens, so they are stripped from errors.
fn send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.without_url().to_string())
    }
}

fn ensure_success(res: Response) -> Result<Response, TransportError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    Err(TransportError::Status {
        status: status.as_u16(),
        message: status.canonical_reason().unwrap_or("unknown status").to_string(),
    })
}

// First non-empty JSESSIONID across all Set-Cookie headers.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.trim().to_string())
        })
        .find(|token| !token.is_empty())
}
