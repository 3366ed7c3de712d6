//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: an
//! in-memory SID store, settings pointed at a mock device, and the
//! wiremock choreography of the firmware's login handshake.

#![allow(dead_code)]

/// Test helper functions
pub mod helpers {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    use cbn_agent::session::USER_AGENT;
    use cbn_agent::{Settings, SidStore};

    /// Settings pointed at a mock device, with test credentials and SID
    /// persistence disabled.
    pub fn device_settings(base_url: &str) -> Settings {
        let mut settings = Settings::default();
        settings.device.base_url = base_url.to_string();
        settings.device.timeout = Duration::from_secs(5);
        settings.auth.username = "alice".to_string();
        settings.auth.password = "secret".to_string();
        settings.session.sid_file = None;
        settings
    }

    /// In-memory [`SidStore`] with call accounting.
    #[derive(Debug, Clone, Default)]
    pub struct MemorySidStore {
        inner: Arc<Mutex<MemoryInner>>,
    }

    #[derive(Debug, Default)]
    struct MemoryInner {
        sid: Option<String>,
        store_calls: usize,
    }

    impl MemorySidStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store that already holds a SID, as if a previous run saved one.
        pub fn preloaded(sid: &str) -> Self {
            let store = Self::new();
            store.inner.lock().unwrap().sid = Some(sid.to_string());
            store
        }

        pub fn stored(&self) -> Option<String> {
            self.inner.lock().unwrap().sid.clone()
        }

        pub fn store_calls(&self) -> usize {
            self.inner.lock().unwrap().store_calls
        }
    }

    #[async_trait::async_trait]
    impl SidStore for MemorySidStore {
        async fn load(&self) -> cbn_agent::Result<Option<String>> {
            Ok(self.inner.lock().unwrap().sid.clone())
        }

        async fn store(&self, sid: &str) -> cbn_agent::Result<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.sid = Some(sid.to_string());
            inner.store_calls += 1;
            Ok(())
        }
    }

    /// Matches only requests that do not carry the named header at all.
    pub struct HeaderAbsent(pub &'static str);

    impl Match for HeaderAbsent {
        fn matches(&self, request: &Request) -> bool {
            !request.headers.contains_key(self.0)
        }
    }

    /// Matches only requests whose named header equals the value whole.
    /// The stock `header` matcher splits incoming values on commas, so it
    /// cannot match an HTTP date.
    pub struct HeaderExact(pub &'static str, pub &'static str);

    impl Match for HeaderExact {
        fn matches(&self, request: &Request) -> bool {
            request
                .headers
                .get(self.0)
                .and_then(|value| value.to_str().ok())
                == Some(self.1)
        }
    }

    /// Mount the probe, both handshake getters and the login page POST,
    /// with the exact header and body shapes the firmware expects. The
    /// credential setter is left to each test since its outcome is what
    /// varies. Token choreography: the probe issues `tok1`, the login page
    /// POST reissues `tok2`.
    pub async fn mount_handshake_prelude(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("User-Agent", USER_AGENT))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .and(HeaderAbsent("cookie"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "sessionToken=tok1; Path=/")
                    .set_body_string("<LoginPage/>"),
            )
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xml/getter.xml"))
            .and(header("Cookie", "sessionToken=tok1"))
            .and(body_string("fun=24&token=tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<LoginStatus/>"))
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/common_page/login.html"))
            .and(header("Upgrade-Insecure-Requests", "1"))
            .and(HeaderExact("if-modified-since", "Thu, 29 Mar 2018 02:17:52 GMT"))
            .and(HeaderAbsent("x-requested-with"))
            .and(HeaderAbsent("content-type"))
            .and(header("Cookie", "sessionToken=tok1"))
            .and(body_string(""))
            .respond_with(
                ResponseTemplate::new(200).insert_header("Set-Cookie", "sessionToken=tok2"),
            )
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xml/getter.xml"))
            .and(header("Cookie", "sessionToken=tok2"))
            .and(body_string("fun=3&token=tok2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<SessionMode/>"))
            .expect(1)
            .mount(server)
            .await;
    }

    /// Mount the credential setter answering a successful login for
    /// `alice`/`secret`, issuing the given SID and a final token reissue.
    pub async fn mount_login_success(server: &MockServer, sid: &str) {
        Mock::given(method("POST"))
            .and(path("/xml/setter.xml"))
            .and(header("Cookie", "sessionToken=tok2"))
            .and(body_string("Password=secret&Username=alice&fun=15&token=tok2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "sessionToken=tok3")
                    .set_body_string(format!("successful;SID={sid}")),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}
