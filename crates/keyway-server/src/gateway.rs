//! Request-time access gateway.
//!
//! Every inbound request is reduced to a [`RequestView`] and evaluated
//! against the process-wide [`GatewayPolicy`]. Evaluation is a pure function
//! producing exactly one [`GatewayDecision`]; the [`access_gateway`]
//! middleware turns that decision into a response.
//!
//! Order of checks:
//!
//! 1. State-changing methods whose `Origin` host differs from `Host` are
//!    rejected with 403, whatever the path.
//! 2. Public paths pass, except the login page for a logged-in session,
//!    which redirects home.
//! 3. Protected paths without a session redirect to the login page with the
//!    original path in `redirect`.
//! 4. Everything else passes and receives the security header set.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use url::Url;

use crate::config::GatewaySettings;
use crate::error::GatewayRejection;
use crate::headers::SecurityHeaders;

/// Value the session cookie must hold for a request to count as logged in.
const SESSION_MARKER_VALUE: &str = "true";

/// Route classification of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// Whether the request carries the session marker cookie.
///
/// The cookie is opaque: its only meaning is "present and equal to `true`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMarker {
    LoggedIn,
    Anonymous,
}

impl SessionMarker {
    /// Interpret a raw cookie value.
    pub fn from_cookie(value: Option<&str>) -> Self {
        if value == Some(SESSION_MARKER_VALUE) {
            Self::LoggedIn
        } else {
            Self::Anonymous
        }
    }

    pub fn is_logged_in(self) -> bool {
        self == Self::LoggedIn
    }
}

/// The inputs the gateway looks at.
#[derive(Debug, Clone)]
pub struct RequestView<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub origin: Option<&'a str>,
    pub host: Option<&'a str>,
    pub session: SessionMarker,
}

impl<'a> RequestView<'a> {
    /// Build a view over request parts.
    pub fn from_parts(
        method: &'a Method,
        path: &'a str,
        headers: &'a HeaderMap,
        session: SessionMarker,
    ) -> Self {
        Self {
            method,
            path,
            origin: headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()),
            host: headers.get(header::HOST).and_then(|v| v.to_str().ok()),
            session,
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayDecision {
    /// Continue to the route and attach security headers.
    PassThrough,
    /// Authentication required; `location` is the login URL to send to.
    RedirectToLogin { location: String },
    /// Already logged in while visiting the login page.
    RedirectHome,
    /// Forged cross-origin mutation.
    Forbidden,
}

/// Process-wide gateway configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct GatewayPolicy {
    public_paths: Vec<String>,
    login_path: String,
    session_cookie: String,
    headers: SecurityHeaders,
}

impl GatewayPolicy {
    pub fn new(settings: &GatewaySettings, headers: SecurityHeaders) -> Self {
        Self {
            public_paths: settings.public_paths.clone(),
            login_path: settings.login_path.clone(),
            session_cookie: settings.session_cookie.clone(),
            headers,
        }
    }

    /// Name of the session marker cookie.
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    /// The header set attached to admitted responses.
    pub fn security_headers(&self) -> &SecurityHeaders {
        &self.headers
    }

    /// Classify `path`. An allow-list entry covers itself and its subpaths.
    pub fn classify(&self, path: &str) -> RouteClass {
        let public = self.public_paths.iter().any(|entry| {
            path == entry
                || path
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        });

        if public {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    /// Decide what happens to a request.
    pub fn evaluate(&self, request: &RequestView<'_>) -> GatewayDecision {
        if is_state_changing(request.method) {
            if let (Some(origin), Some(host)) = (request.origin, request.host) {
                if !same_origin(origin, host) {
                    return GatewayDecision::Forbidden;
                }
            }
        }

        let logged_in = request.session.is_logged_in();

        match self.classify(request.path) {
            RouteClass::Public if logged_in && request.path == self.login_path => {
                GatewayDecision::RedirectHome
            }
            RouteClass::Public => GatewayDecision::PassThrough,
            RouteClass::Protected if !logged_in => GatewayDecision::RedirectToLogin {
                location: format!(
                    "{}?redirect={}",
                    self.login_path,
                    urlencoding::encode(request.path)
                ),
            },
            RouteClass::Protected => GatewayDecision::PassThrough,
        }
    }
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Compare an `Origin` header against a `Host` header.
///
/// Hosts compare case-insensitively; a missing port on either side means the
/// origin scheme's default. An unparsable origin never matches.
fn same_origin(origin: &str, host: &str) -> bool {
    let Ok(origin) = Url::parse(origin) else {
        return false;
    };
    let Some(origin_host) = origin.host_str() else {
        return false;
    };
    let origin_port = origin.port_or_known_default();

    let (host_name, host_port) = split_host(host);
    let host_port = match host_port {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => return false,
        },
        None => origin_port,
    };

    origin_host.eq_ignore_ascii_case(host_name) && origin_port == host_port
}

/// Split a `Host` header into name and optional port, keeping IPv6 brackets.
fn split_host(host: &str) -> (&str, Option<&str>) {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => {
                let (name, rest) = host.split_at(end + 1);
                (name, rest.strip_prefix(':'))
            }
            None => (host, None),
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    }
}

/// Access gateway middleware.
///
/// Redirects and rejections short-circuit; admitted requests continue to the
/// inner service and receive the security headers on the way out.
pub async fn access_gateway(
    State(policy): State<Arc<GatewayPolicy>>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let session =
        SessionMarker::from_cookie(jar.get(policy.session_cookie()).map(|c| c.value()));

    let decision = {
        let view = RequestView::from_parts(req.method(), req.uri().path(), req.headers(), session);
        let decision = policy.evaluate(&view);

        if decision == GatewayDecision::Forbidden {
            tracing::warn!(
                method = %view.method,
                path = view.path,
                origin = view.origin,
                host = view.host,
                "rejected cross-origin request"
            );
        } else {
            tracing::debug!(method = %view.method, path = view.path, ?decision, "gateway decision");
        }
        decision
    };

    match decision {
        GatewayDecision::PassThrough => {
            let mut response = next.run(req).await;
            policy.security_headers().apply(response.headers_mut());
            response
        }
        GatewayDecision::RedirectToLogin { location } => {
            Redirect::temporary(&location).into_response()
        }
        GatewayDecision::RedirectHome => Redirect::temporary("/").into_response(),
        GatewayDecision::Forbidden => GatewayRejection::CrossOrigin.into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use keyway_core::ConsoleConfig;

    use super::*;

    fn policy() -> GatewayPolicy {
        let console = ConsoleConfig::new("https://api.keyway.sh").unwrap();
        GatewayPolicy::new(
            &GatewaySettings::default(),
            SecurityHeaders::from_config(&console).unwrap(),
        )
    }

    fn view<'a>(method: &'a Method, path: &'a str, session: SessionMarker) -> RequestView<'a> {
        RequestView {
            method,
            path,
            origin: None,
            host: None,
            session,
        }
    }

    #[test]
    fn session_marker_requires_exact_true() {
        assert_eq!(SessionMarker::from_cookie(Some("true")), SessionMarker::LoggedIn);
        for raw in [None, Some(""), Some("false"), Some("TRUE"), Some("true ")] {
            assert_eq!(SessionMarker::from_cookie(raw), SessionMarker::Anonymous);
        }
    }

    #[test]
    fn classification_uses_segment_prefixes() {
        let policy = policy();
        assert_eq!(policy.classify("/login"), RouteClass::Public);
        assert_eq!(policy.classify("/auth/callback"), RouteClass::Public);
        assert_eq!(policy.classify("/auth/callback/github"), RouteClass::Public);
        assert_eq!(policy.classify("/assets/index-3f9a.js"), RouteClass::Public);
        assert_eq!(policy.classify("/favicon.ico"), RouteClass::Public);
        assert_eq!(policy.classify("/loginx"), RouteClass::Protected);
        assert_eq!(policy.classify("/"), RouteClass::Protected);
        assert_eq!(policy.classify("/vaults/acme/api"), RouteClass::Protected);
    }

    #[test]
    fn protected_without_session_redirects_with_original_path() {
        let policy = policy();
        for path in ["/", "/vaults", "/orgs/acme/settings"] {
            let decision = policy.evaluate(&view(&Method::GET, path, SessionMarker::Anonymous));
            assert_eq!(
                decision,
                GatewayDecision::RedirectToLogin {
                    location: format!("/login?redirect={}", urlencoding::encode(path)),
                }
            );
        }

        let decision = policy.evaluate(&view(&Method::GET, "/a b", SessionMarker::Anonymous));
        assert_eq!(
            decision,
            GatewayDecision::RedirectToLogin {
                location: "/login?redirect=%2Fa%20b".to_owned(),
            }
        );
    }

    #[test]
    fn protected_with_session_passes() {
        let decision = policy().evaluate(&view(&Method::GET, "/vaults", SessionMarker::LoggedIn));
        assert_eq!(decision, GatewayDecision::PassThrough);
    }

    #[test]
    fn login_page_depends_on_session() {
        let policy = policy();
        assert_eq!(
            policy.evaluate(&view(&Method::GET, "/login", SessionMarker::LoggedIn)),
            GatewayDecision::RedirectHome
        );
        assert_eq!(
            policy.evaluate(&view(&Method::GET, "/login", SessionMarker::Anonymous)),
            GatewayDecision::PassThrough
        );
        assert_eq!(
            policy.evaluate(&view(&Method::GET, "/auth/callback", SessionMarker::LoggedIn)),
            GatewayDecision::PassThrough
        );
    }

    #[test]
    fn forged_mutations_are_forbidden_on_any_path() {
        let policy = policy();
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            for path in ["/login", "/vaults"] {
                for session in [SessionMarker::LoggedIn, SessionMarker::Anonymous] {
                    let request = RequestView {
                        origin: Some("https://evil.example"),
                        host: Some("console.keyway.sh"),
                        ..view(&method, path, session)
                    };
                    assert_eq!(policy.evaluate(&request), GatewayDecision::Forbidden);
                }
            }
        }
    }

    #[test]
    fn csrf_guard_needs_both_headers_and_a_mutation() {
        let policy = policy();

        let get = RequestView {
            origin: Some("https://evil.example"),
            host: Some("console.keyway.sh"),
            ..view(&Method::GET, "/vaults", SessionMarker::LoggedIn)
        };
        assert_eq!(policy.evaluate(&get), GatewayDecision::PassThrough);

        let no_origin = RequestView {
            host: Some("console.keyway.sh"),
            ..view(&Method::POST, "/vaults", SessionMarker::LoggedIn)
        };
        assert_eq!(policy.evaluate(&no_origin), GatewayDecision::PassThrough);

        let no_host = RequestView {
            origin: Some("https://evil.example"),
            ..view(&Method::POST, "/vaults", SessionMarker::LoggedIn)
        };
        assert_eq!(policy.evaluate(&no_host), GatewayDecision::PassThrough);
    }

    #[test]
    fn origin_comparison() {
        assert!(same_origin("https://console.keyway.sh", "console.keyway.sh"));
        assert!(same_origin("https://Console.Keyway.sh", "console.keyway.sh"));
        assert!(same_origin("https://console.keyway.sh", "console.keyway.sh:443"));
        assert!(same_origin("http://localhost:3000", "localhost:3000"));
        assert!(same_origin("http://[::1]:3000", "[::1]:3000"));

        assert!(!same_origin("http://localhost:3001", "localhost:3000"));
        assert!(!same_origin("https://keyway.sh.evil.example", "keyway.sh"));
        assert!(!same_origin("null", "console.keyway.sh"));
        assert!(!same_origin("https://console.keyway.sh", "console.keyway.sh:http"));
    }
}
