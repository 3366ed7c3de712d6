//! Session aggregate
//!
//! The two cookie values the device hands back, plus the header profile
//! currently in effect. The ephemeral token is reissued on most responses
//! and always tracks the latest value seen; the SID only ever comes out of
//! a credential login or persisted storage.

use crate::error::{Error, Result};

use super::headers::HeaderProfile;

/// Cookie name of the short-lived token the device reissues per response.
pub const TOKEN_COOKIE: &str = "sessionToken";
/// Cookie name of the long-lived session id.
pub const SID_COOKIE: &str = "SID";

/// Mutable session identifiers and the active header profile.
///
/// Only the handshake state machine and the function invocation layer touch
/// this, both through `&mut` access on the agent, so updates cannot
/// interleave within one session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    token: Option<String>,
    sid: Option<String>,
    profile: HeaderProfile,
}

impl SessionState {
    /// Fresh state: no token, no SID, AJAX profile active.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ephemeral token from the most recent response that carried one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Durable session id, once obtained or loaded.
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// Currently active header profile.
    pub fn profile(&self) -> HeaderProfile {
        self.profile
    }

    /// Switch the active header profile.
    pub fn set_profile(&mut self, profile: HeaderProfile) {
        self.profile = profile;
    }

    /// Adopt a durable session id.
    pub fn set_sid(&mut self, sid: impl Into<String>) {
        self.sid = Some(sid.into());
    }

    /// Fold one response's cookies into the session.
    ///
    /// An empty list is normal for the intermediate handshake steps and
    /// leaves everything untouched. A non-empty list must start with the
    /// `sessionToken` reissue; any other first cookie means the firmware's
    /// session model no longer matches this implementation.
    pub fn absorb_cookies(&mut self, cookies: &[(String, String)]) -> Result<()> {
        let Some((name, value)) = cookies.first() else {
            tracing::debug!("response carried no cookies, session unchanged");
            return Ok(());
        };
        if name != TOKEN_COOKIE {
            return Err(Error::protocol(format!(
                "expected first cookie {TOKEN_COOKIE}, device sent {name:?}"
            )));
        }
        self.token = Some(value.clone());
        Ok(())
    }

    /// `Cookie` header value for the next request, or `None` before any
    /// session material exists.
    ///
    /// Pairs are joined with `;`, the separator the stock web UI uses.
    pub fn cookie_header(&self) -> Option<String> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(token) = &self.token {
            pairs.push(format!("{TOKEN_COOKIE}={token}"));
        }
        if let Some(sid) = &self.sid {
            pairs.push(format!("{SID_COOKIE}={sid}"));
        }
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join(";"))
        }
    }
}
