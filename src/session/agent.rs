//! # Session Agent Module
//!
//! Core session handling for the device's browser-facing AJAX/XML
//! interface. The [`CbnAgent`] owns the HTTP client, the cookie state and
//! the SID store, and walks the firmware's login choreography:
//!
//! 1. Bare `GET /` to receive the first `sessionToken` cookie
//! 2. Getter `fun=24` to open the handshake
//! 3. `POST /common_page/login.html` under the insecure-upgrade profile
//! 4. Getter `fun=3` to arm the login
//! 5. Setter `fun=15` carrying the credentials, answered with
//!    `successful;SID=<id>`
//!
//! A stored SID short-circuits all of this: the agent comes back with a
//! single bare `GET` under the `SID` cookie alone.
//!
//! All session mutation goes through `&mut self`, so one agent can never
//! interleave two exchanges.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use cbn_agent::config::Settings;
//! use cbn_agent::session::CbnAgent;
//!
//! # tokio_test::block_on(async {
//! let mut settings = Settings::default();
//! settings.auth.username = "admin".to_string();
//! settings.auth.password = "secret".to_string();
//!
//! let mut agent = CbnAgent::new(settings)?;
//! agent.authenticate().await?;
//! println!("session established, SID length: {:?}", agent.sid().map(str::len));
//! # Ok::<(), cbn_agent::Error>(())
//! # });
//! ```

use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, Response};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::persist::{FileSidStore, SidStore};

use super::functions::{Endpoint, Function};
use super::headers::HeaderProfile;
use super::request::{self, ParamMap, RequestBuilder, encode_params};
use super::state::{SID_COOKIE, SessionState};

/// Login page the handshake POSTs to under the insecure-upgrade profile.
const LOGIN_PAGE_PATH: &str = "/common_page/login.html";

/// Convenience type alias for the agent with file-backed SID storage.
pub type CbnAgent = CbnAgentGeneric<FileSidStore>;

/// Session agent for one device.
#[derive(Debug)]
pub struct CbnAgentGeneric<S: SidStore = FileSidStore> {
    /// Configuration settings
    settings: Settings,
    /// HTTP client for device requests
    http_client: Client,
    /// Request construction against the device base URL
    builder: RequestBuilder,
    /// Cookie values and active header profile
    state: SessionState,
    /// SID storage backend, `None` when persistence is disabled
    sid_store: Option<S>,
}

impl CbnAgentGeneric<FileSidStore> {
    /// Creates a new agent with file-backed SID persistence.
    ///
    /// The SID file path comes from the settings; a `None` path disables
    /// persistence and every run logs in from scratch.
    ///
    /// # Errors
    ///
    /// Fails when the base URL or proxy URL cannot be parsed, or the HTTP
    /// client cannot be constructed.
    pub fn new(settings: Settings) -> Result<Self> {
        let sid_store = settings.session.sid_file.clone().map(FileSidStore::new);
        Self::with_sid_store(settings, sid_store)
    }
}

impl<S: SidStore> CbnAgentGeneric<S> {
    /// Creates a new agent with a custom SID storage backend.
    pub fn with_sid_store(settings: Settings, sid_store: Option<S>) -> Result<Self> {
        let base = settings.base_url()?;
        let http_client = build_http_client(&settings)?;
        Ok(Self {
            settings,
            http_client,
            builder: RequestBuilder::new(base),
            state: SessionState::new(),
            sid_store,
        })
    }

    /// Durable session id, once authenticated.
    pub fn sid(&self) -> Option<&str> {
        self.state.sid()
    }

    /// Settings the agent was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Establish an authenticated session.
    ///
    /// Resumes from a stored SID when one exists and looks plausible,
    /// otherwise performs the full credential handshake. Calling this on
    /// an already authenticated agent does nothing.
    ///
    /// # Errors
    ///
    /// * [`Error::Config`] when a credential login is needed but no
    ///   credentials are configured
    /// * [`Error::Auth`] when the device rejects the credentials
    /// * [`Error::Protocol`] when a response does not match the known
    ///   firmware behavior
    /// * [`Error::Transport`] for connection level failures
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.state.sid().is_some() {
            debug!("already authenticated, nothing to do");
            return Ok(());
        }
        if self.try_resume().await? {
            return Ok(());
        }
        self.fresh_login().await
    }

    /// Execute a getter function against `/xml/getter.xml`.
    pub async fn getter(&mut self, function: Function) -> Result<String> {
        self.xml_call(Endpoint::Getter, function, ParamMap::new())
            .await
    }

    /// Execute a setter function against `/xml/setter.xml` with extra
    /// parameters merged into the body.
    pub async fn setter(&mut self, function: Function, params: ParamMap) -> Result<String> {
        self.xml_call(Endpoint::Setter, function, params).await
    }

    /// Try to come back on a stored SID without credentials.
    ///
    /// The device is probed with one bare GET under the stored identity.
    /// The probe is not a validity check; a stale SID only shows up once a
    /// real function call is rejected.
    async fn try_resume(&mut self) -> Result<bool> {
        let Some(store) = &self.sid_store else {
            return Ok(false);
        };
        let sid = match store.load().await {
            Ok(Some(sid)) => sid,
            Ok(None) => {
                debug!("no stored SID, credential login required");
                return Ok(false);
            }
            Err(e) => {
                warn!("cannot load stored SID: {e}");
                return Ok(false);
            }
        };
        if !sid_looks_valid(&sid) {
            warn!(len = sid.len(), "stored SID too short, ignoring it");
            return Ok(false);
        }

        self.state.set_sid(sid);
        if let Err(e) = self.send(Method::GET, "", String::new()).await {
            // A failed probe must not leave the agent looking logged in.
            self.state = SessionState::new();
            return Err(e);
        }
        info!("session resumed from stored SID");
        Ok(true)
    }

    /// Full credential handshake against a fresh session.
    async fn fresh_login(&mut self) -> Result<()> {
        self.settings.require_credentials()?;
        info!(url = %self.builder.base(), "logging in with credentials");

        // Initial probe, picks up the first session token.
        self.send(Method::GET, "", String::new()).await?;

        self.getter(Function::HandshakeOpen).await?;

        // The firmware insists on its browser-upgrade header shape for
        // this one POST; the profile is reverted before the result is
        // inspected so an error cannot leave it active.
        self.state.set_profile(HeaderProfile::InsecureUpgrade);
        let upgrade = self.send(Method::POST, LOGIN_PAGE_PATH, String::new()).await;
        self.state.set_profile(HeaderProfile::Ajax);
        upgrade?;

        self.getter(Function::HandshakeArm).await?;

        let mut credentials = ParamMap::new();
        credentials.insert(
            "Username".to_string(),
            vec![self.settings.auth.username.clone()],
        );
        credentials.insert(
            "Password".to_string(),
            vec![self.settings.auth.password.clone()],
        );
        let body = self.setter(Function::Login, credentials).await?;

        if !body.contains("successful") {
            return Err(Error::auth(body.trim()));
        }
        let sid = parse_sid(&body)?;
        info!(sid_len = sid.len(), "login successful");
        self.state.set_sid(sid.clone());
        self.persist_sid(&sid).await;
        Ok(())
    }

    /// Best-effort SID persistence. A failed write never fails the login,
    /// the in-memory session is live either way.
    async fn persist_sid(&self, sid: &str) {
        let Some(store) = &self.sid_store else {
            debug!("SID persistence disabled");
            return;
        };
        if let Err(e) = store.store(sid).await {
            warn!("cannot persist SID: {e}");
        }
    }

    /// One getter/setter exchange. Starts from the implicit `fun` opcode
    /// and, once the device has issued one, the current `token` parameter;
    /// caller-supplied keys win on collision.
    async fn xml_call(
        &mut self,
        endpoint: Endpoint,
        function: Function,
        params: ParamMap,
    ) -> Result<String> {
        let mut merged = ParamMap::new();
        merged.insert("fun".to_string(), vec![function.opcode().to_string()]);
        if let Some(token) = self.state.token() {
            merged.insert("token".to_string(), vec![token.to_string()]);
        }
        merged.extend(params);
        debug!(function = function.name(), path = endpoint.path(), "xml function call");
        self.send(Method::POST, endpoint.path(), encode_params(&merged))
            .await
    }

    /// Dispatch one request under the current session and fold the
    /// response back into it. Every device exchange funnels through here.
    async fn send(&mut self, method: Method, path: &str, body: String) -> Result<String> {
        let cookie = self.state.cookie_header();
        let request = self.builder.build(
            method,
            path,
            body,
            self.state.profile(),
            cookie.as_deref(),
        )?;
        let response = request::execute(&self.http_client, request).await?;
        self.update_session(response).await
    }

    /// Absorb a response into the session and hand back its body.
    ///
    /// The body is always read to the end, even when the cookie check
    /// fails afterwards.
    async fn update_session(&mut self, response: Response) -> Result<String> {
        let cookies = extract_cookies(response.headers());
        let status = response.status();
        let body = response.text().await?;
        self.state.absorb_cookies(&cookies)?;
        tracing::trace!(%status, bytes = body.len(), "response folded into session");
        Ok(body)
    }
}

/// Pull `name=value` pairs out of `Set-Cookie` headers, dropping
/// attributes like `Path` or `HttpOnly`.
fn extract_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Extract the SID from a login response shaped `successful;SID=987462656`.
fn parse_sid(body: &str) -> Result<String> {
    let field = body.split(';').nth(1).and_then(|seg| seg.split_once('='));
    let Some((name, value)) = field else {
        return Err(Error::protocol(format!(
            "login response carries no SID field: {body:?}"
        )));
    };
    let value = value.trim();
    if name.trim() != SID_COOKIE || value.is_empty() {
        return Err(Error::protocol(format!(
            "login response carries no SID field: {body:?}"
        )));
    }
    Ok(value.to_string())
}

/// Real SIDs are long digit strings; anything four bytes or shorter is
/// not one.
fn sid_looks_valid(sid: &str) -> bool {
    sid.len() > 4
}

fn build_http_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder().timeout(settings.device.timeout);
    if let Some(proxy) = &settings.network.proxy {
        debug!(%proxy, "routing device traffic through proxy");
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| Error::config(format!("invalid proxy URL {proxy:?}: {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| Error::construction(format!("cannot build HTTP client: {e}")))
}
