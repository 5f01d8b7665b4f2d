use std::sync::{Arc, RwLock};

use chrono::Utc;
use common_api::Envelope;
use common_auth::{decode_unverified, Portal, SessionClaims};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::store::TokenStore;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const INVALID_TOKEN_FROM_UPSTREAM: &str = "Invalid or expired token received";

#[derive(Default)]
struct Projection {
    user: Option<SessionClaims>,
    token: Option<String>,
}

/// Point-in-time view of the session. `is_authenticated` is evaluated at
/// snapshot time: token present, decodable, and unexpired.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: Option<SessionClaims>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

/// Request shape accepted by [`SessionStore::api_call`].
pub struct ApiRequest {
    method: Method,
    body: ApiBody,
}

enum ApiBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

impl ApiRequest {
    pub fn get() -> Self {
        Self::with_method(Method::GET)
    }

    pub fn post() -> Self {
        Self::with_method(Method::POST)
    }

    pub fn put() -> Self {
        Self::with_method(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    fn with_method(method: Method) -> Self {
        Self {
            method,
            body: ApiBody::Empty,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = ApiBody::Json(body);
        self
    }

    /// Multipart bodies deliberately carry no explicit content-type; the
    /// transport computes the boundary itself.
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = ApiBody::Multipart(form);
        self
    }
}

/// Parsed body and raw status together, so callers can branch on either.
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    /// Apply the envelope's tagged projection: `Ok(data)` | `Err(message)`.
    pub fn into_result(self) -> Result<Value, SessionError> {
        let envelope: Envelope = serde_json::from_value(self.body)
            .map_err(|err| SessionError::Protocol(format!("not a status envelope: {err}")))?;
        envelope.into_result().map_err(SessionError::Rejected)
    }
}

/// Single source of truth for "is the current visitor authenticated, as
/// whom, and with what credential", plus the uniform authorized request
/// helper every consumer goes through.
///
/// Explicitly constructed and handed to whatever layer consumes it; there
/// is no ambient global instance. Construction runs the initial validity
/// check; pair with [`crate::spawn_revalidation`] for the periodic and
/// cross-handle triggers, and call [`Self::check_token_validity`] from the
/// embedder's focus hook.
pub struct SessionStore {
    config: SessionConfig,
    http: Client,
    store: Arc<dyn TokenStore>,
    state: RwLock<Projection>,
}

impl SessionStore {
    pub fn new(config: SessionConfig, store: Arc<dyn TokenStore>) -> Self {
        let session = Self {
            config,
            http: Client::new(),
            store,
            state: RwLock::new(Projection::default()),
        };
        session.check_token_validity();
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn store_changes(&self) -> watch::Receiver<u64> {
        self.store.changes()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().expect("rwlock poisoned");
        let now = Utc::now();
        let is_authenticated = match (&state.user, &state.token) {
            (Some(user), Some(_)) => !user.is_expired_at(now),
            _ => false,
        };
        SessionSnapshot {
            user: state.user.clone(),
            token: state.token.clone(),
            is_authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated
    }

    pub fn is_teacher(&self) -> bool {
        self.snapshot().user.is_some_and(|user| user.is_teacher())
    }

    pub fn is_student(&self) -> bool {
        self.snapshot().user.is_some_and(|user| user.is_student())
    }

    pub fn current_user(&self) -> Option<SessionClaims> {
        self.snapshot().user
    }

    /// Re-derive the in-memory projection from persisted storage.
    ///
    /// Absent token clears the projection; an expired or undecodable token
    /// forces a full logout; a valid token refreshes the projection. Safe
    /// to call repeatedly and concurrently: it is one short read followed
    /// by one conditional write over the same slot, so the worst a race can
    /// produce is a redundant logout or an extra pass.
    pub fn check_token_validity(&self) {
        let stored = match self.store.load() {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "credential storage read failed; keeping current state");
                return;
            }
        };

        let Some(token) = stored else {
            let mut state = self.state.write().expect("rwlock poisoned");
            state.user = None;
            state.token = None;
            return;
        };

        match decode_unverified(&token) {
            Ok(claims) if !claims.is_expired() => {
                let mut state = self.state.write().expect("rwlock poisoned");
                state.user = Some(claims);
                state.token = Some(token);
            }
            _ => {
                debug!("stored credential expired or undecodable, logging out");
                self.logout();
            }
        }
    }

    /// Clear the persisted token and the in-memory projection. Idempotent;
    /// a second call on an already-logged-out session changes nothing.
    pub fn logout(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear credential storage during logout");
        }
        let mut state = self.state.write().expect("rwlock poisoned");
        state.user = None;
        state.token = None;
    }

    /// Exchange credentials for a token at the gateway's login route.
    ///
    /// A 2xx answer whose token fails decode or is already expired is
    /// rejected even though the HTTP call succeeded; a compromised or
    /// malformed upstream must not yield an authenticated session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Portal, SessionError> {
        let url = format!("{}/api/auth/login", self.config.gateway_base);
        let response = self
            .http
            .post(url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| SessionError::Network(err.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| SessionError::Protocol(err.to_string()))?;

        let token = if status.is_success() {
            body.get("token").and_then(Value::as_str)
        } else {
            None
        };
        let Some(token) = token else {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(LOGIN_FAILED);
            return Err(SessionError::Rejected(message.to_string()));
        };

        match decode_unverified(token) {
            Ok(claims) if !claims.is_expired() => {
                self.store.save(token)?;
                let portal = Portal::for_role(&claims.role);
                let mut state = self.state.write().expect("rwlock poisoned");
                state.user = Some(claims);
                state.token = Some(token.to_owned());
                Ok(portal)
            }
            _ => {
                warn!("login answered 2xx but the token fails validation");
                Err(SessionError::Rejected(INVALID_TOKEN_FROM_UPSTREAM.into()))
            }
        }
    }

    /// One-shot registration; never touches session state.
    pub async fn register_teacher(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, SessionError> {
        self.register("User/RegisterTeacher", name, email, password)
            .await
    }

    /// One-shot registration; never touches session state.
    pub async fn register_student(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, SessionError> {
        self.register("User/RegisterStudent", name, email, password)
            .await
    }

    async fn register(
        &self,
        path: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, SessionError> {
        let url = format!("{}/api/proxy/{path}", self.config.gateway_base);
        let response = self
            .http
            .post(url)
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| SessionError::Network(err.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| SessionError::Protocol(err.to_string()))?;

        match serde_json::from_value::<Envelope>(body) {
            Ok(envelope) if status.is_success() && envelope.status => Ok(envelope.message),
            Ok(envelope) if !envelope.message.is_empty() => {
                Err(SessionError::Rejected(envelope.message))
            }
            _ => Err(SessionError::Rejected(REGISTRATION_FAILED.into())),
        }
    }

    /// Guarded request helper.
    ///
    /// A held-but-expired (or undecodable) credential forces a logout and
    /// returns [`SessionError::Unauthorized`] without touching the network.
    /// A relayed 401 does the same after the fact. Everything else comes
    /// back as [`ApiReply`].
    pub async fn api_call(
        &self,
        endpoint: &str,
        request: ApiRequest,
    ) -> Result<ApiReply, SessionError> {
        let token = self.store.load()?;

        if let Some(token) = &token {
            match decode_unverified(token) {
                Ok(claims) if !claims.is_expired() => {}
                _ => {
                    debug!("credential expired before request; logging out");
                    self.logout();
                    return Err(SessionError::Unauthorized);
                }
            }
        }

        let url = format!(
            "{}/api/proxy/{}",
            self.config.gateway_base,
            endpoint.trim_start_matches('/')
        );
        let mut builder = self.http.request(request.method, url);
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            ApiBody::Empty => builder,
            ApiBody::Json(value) => builder.json(&value),
            ApiBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder
            .send()
            .await
            .map_err(|err| SessionError::Network(err.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("gateway answered 401; logging out");
            self.logout();
            return Err(SessionError::Unauthorized);
        }

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| SessionError::Protocol(err.to_string()))?;

        Ok(ApiReply { status, body })
    }
}
