//! Security response headers.
//!
//! The Content-Security-Policy is a fold over a list of contributions: the
//! fixed baseline is always enabled, and each integration contributes its
//! sources only when its identifying configuration value is present. The
//! remaining headers are unconditional. Everything is assembled once at
//! startup; per request the gateway only copies prebuilt values.

use axum::http::header::{
    CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
    X_XSS_PROTECTION,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use keyway_core::{source_origin, ConsoleConfig};

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// Sources one feature adds to one CSP directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspContribution {
    pub enabled: bool,
    pub directive: &'static str,
    pub sources: Vec<String>,
}

impl CspContribution {
    fn always(directive: &'static str, sources: &[&str]) -> Self {
        Self::when(true, directive, sources.iter().map(|s| (*s).to_owned()).collect())
    }

    fn when(enabled: bool, directive: &'static str, sources: Vec<String>) -> Self {
        Self {
            enabled,
            directive,
            sources,
        }
    }
}

/// Baseline plus every integration's contribution, enabled or not.
pub fn csp_contributions(config: &ConsoleConfig) -> Vec<CspContribution> {
    let integrations = &config.integrations;

    let mut contributions = vec![
        CspContribution::always("default-src", &["'self'"]),
        CspContribution::always("script-src", &["'self'", "'unsafe-inline'"]),
        CspContribution::always("style-src", &["'self'", "'unsafe-inline'"]),
        CspContribution::always(
            "img-src",
            &["'self'", "data:", "https://avatars.githubusercontent.com", "https://github.com"],
        ),
        CspContribution::always("font-src", &["'self'", "data:"]),
        CspContribution::when(true, "connect-src", vec!["'self'".to_owned(), config.api_origin()]),
        CspContribution::always("object-src", &["'none'"]),
        CspContribution::always("base-uri", &["'self'"]),
        CspContribution::always("form-action", &["'self'"]),
        CspContribution::always("frame-ancestors", &["'none'"]),
    ];

    let posthog_host = integrations
        .posthog
        .as_ref()
        .and_then(|p| source_origin(&p.host));
    contributions.push(CspContribution::when(
        posthog_host.is_some(),
        "script-src",
        posthog_host.iter().cloned().collect(),
    ));
    contributions.push(CspContribution::when(
        posthog_host.is_some(),
        "connect-src",
        posthog_host.into_iter().collect(),
    ));

    let sentry_origin = integrations.sentry_dsn.as_deref().map(sentry_ingest_origin);
    contributions.push(CspContribution::when(
        sentry_origin.is_some(),
        "connect-src",
        sentry_origin.into_iter().collect(),
    ));

    let crisp = integrations.crisp_website_id.is_some();
    let crisp_client = "https://client.crisp.chat".to_owned();
    contributions.extend([
        CspContribution::when(crisp, "script-src", vec![crisp_client.clone()]),
        CspContribution::when(crisp, "style-src", vec![crisp_client.clone()]),
        CspContribution::when(crisp, "font-src", vec![crisp_client.clone()]),
        CspContribution::when(
            crisp,
            "img-src",
            vec![crisp_client.clone(), "https://image.crisp.chat".to_owned()],
        ),
        CspContribution::when(
            crisp,
            "connect-src",
            vec![crisp_client, "wss://client.relay.crisp.chat".to_owned()],
        ),
    ]);

    contributions
}

/// Fold enabled contributions into a policy string.
///
/// Directives keep the order of their first appearance; sources are
/// de-duplicated within a directive.
pub fn fold_policy(contributions: &[CspContribution]) -> String {
    let mut directives: Vec<(&'static str, Vec<&str>)> = Vec::new();

    for contribution in contributions.iter().filter(|c| c.enabled) {
        let idx = match directives.iter().position(|(d, _)| *d == contribution.directive) {
            Some(idx) => idx,
            None => {
                directives.push((contribution.directive, Vec::new()));
                directives.len() - 1
            }
        };

        let sources = &mut directives[idx].1;
        for source in &contribution.sources {
            if !sources.contains(&source.as_str()) {
                sources.push(source);
            }
        }
    }

    directives
        .iter()
        .map(|(directive, sources)| format!("{directive} {}", sources.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Origin events are posted to for a Sentry DSN.
fn sentry_ingest_origin(dsn: &str) -> String {
    source_origin(dsn).unwrap_or_else(|| "https://*.ingest.sentry.io".to_owned())
}

/// Prebuilt security header set attached to every admitted response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    /// Assemble the header set for `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHeaderValue` if a configured integration value cannot
    /// appear in a header (e.g. contains a newline).
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, InvalidHeaderValue> {
        let policy = fold_policy(&csp_contributions(config));

        let headers = vec![
            (CONTENT_SECURITY_POLICY, HeaderValue::from_str(&policy)?),
            (X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
            (
                REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ),
            (
                PERMISSIONS_POLICY,
                HeaderValue::from_static("camera=(), microphone=(), geolocation=(), payment=()"),
            ),
        ];

        Ok(Self { headers })
    }

    /// The assembled Content-Security-Policy.
    pub fn content_security_policy(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| *name == CONTENT_SECURITY_POLICY)
            .and_then(|(_, value)| value.to_str().ok())
    }

    /// Insert every header into `headers`, overriding existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}
