//! Fixed header profiles for the device's two expected client shapes
//!
//! The firmware serves one header shape to its AJAX/XML machinery and
//! insists on another for the login page POST. Both sets were captured from
//! the stock web UI and are reproduced byte for byte; only the `Cookie`
//! header is ever computed.

/// Browser User-Agent sent on every request.
///
/// Required: the firmware ignores requests from non-browser user agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:60.0) Gecko/20100101 Firefox/60.0";

/// Header entries for the AJAX/XML call profile.
const AJAX_HEADERS: &[(&str, &[&str])] = &[
    ("Referer", &["http://192.168.0.1/common_page/login.html"]),
    (
        "Content-Type",
        &["application/x-www-form-urlencoded; charset=UTF-8"],
    ),
    ("X-Requested-With", &["XMLHttpRequest"]),
    ("Connection", &["keep-alive"]),
    ("Accept", &["application/xml, text/xml, */*; q=0.01"]),
    ("Accept-Language", &["en-US,en;q=0.5"]),
    ("Accept-Encoding", &["gzip, deflate"]),
];

/// Header entries for the transient login-page POST.
///
/// The login flow was apparently meant to upgrade to HTTPS and the firmware
/// stopped half way; it still expects this exact profile on that one POST,
/// down to the frozen If-Modified-Since date.
const INSECURE_UPGRADE_HEADERS: &[(&str, &[&str])] = &[
    ("Referer", &["http://192.168.0.1/"]),
    ("Connection", &["keep-alive"]),
    (
        "Accept",
        &["text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"],
    ),
    ("Accept-Language", &["en-US,en;q=0.5"]),
    ("Accept-Encoding", &["gzip, deflate"]),
    ("Upgrade-Insecure-Requests", &["1"]),
    ("If-Modified-Since", &["Thu, 29 Mar 2018 02:17:52 GMT"]),
];

/// Named, immutable header profile.
///
/// The session tags which profile is active; the tables themselves never
/// change, so a request can only ever carry one of the two captured shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderProfile {
    /// Profile for all getter/setter XML calls.
    #[default]
    Ajax,
    /// Profile for the login page POST during the handshake.
    InsecureUpgrade,
}

impl HeaderProfile {
    /// Static header entries for this profile.
    ///
    /// Multi-valued entries are joined with `;` when the request is built,
    /// the same way the computed `Cookie` header joins its pairs.
    pub fn entries(self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            HeaderProfile::Ajax => AJAX_HEADERS,
            HeaderProfile::InsecureUpgrade => INSECURE_UPGRADE_HEADERS,
        }
    }
}
