//! Session state and per-request context.
//!
//! The server remembers a few values between requests (the template being
//! previewed, the channel token). Handlers never read that state while a
//! request is in flight; they take a [`RequestContext`] snapshot first and
//! pass it explicitly to the content functions.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::store::ContentSet;

/// Cross-request state held by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Template (or standalone content set) whose content is served.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub channel_token: Option<String>,
    /// Last content item previewed, kept for client tooling.
    #[serde(default)]
    pub content_item: Option<String>,
}

impl Session {
    pub fn from_config(config: &Config) -> Self {
        Self {
            template: config.server.default_template.clone(),
            ..Default::default()
        }
    }
}

/// Immutable inputs for one content request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Resolved content set, `None` when the session names nothing usable.
    pub content_set: Option<ContentSet>,
    pub channel_token: Option<String>,
    pub default_limit: usize,
    pub variation_scan_limit: Option<usize>,
}

impl RequestContext {
    /// Resolve the session's template against the configured folders.
    pub fn from_session(config: &Config, session: &Session) -> Self {
        let content_set = session
            .template
            .as_deref()
            .and_then(|name| ContentSet::open(config, name));
        Self {
            content_set,
            channel_token: session.channel_token.clone(),
            default_limit: config.query.default_limit,
            variation_scan_limit: config.query.scan_limit(),
        }
    }

    /// Context for an explicitly named content set (CLI commands).
    pub fn for_content_set(config: &Config, name: &str) -> Self {
        Self::from_session(
            config,
            &Session {
                template: Some(name.to_string()),
                ..Default::default()
            },
        )
    }

    /// Context over an already-resolved content set.
    pub fn with_set(set: ContentSet) -> Self {
        let query = crate::config::QueryConfig::default();
        Self {
            content_set: Some(set),
            channel_token: None,
            default_limit: query.default_limit,
            variation_scan_limit: query.scan_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_wire_names() {
        let session: Session =
            serde_json::from_str(r#"{"template":"Blog","channelToken":"abc"}"#).unwrap();
        assert_eq!(session.template.as_deref(), Some("Blog"));
        assert_eq!(session.channel_token.as_deref(), Some("abc"));
        assert!(session.content_item.is_none());
    }

    #[test]
    fn test_context_without_template() {
        let tmp = TempDir::new().unwrap();
        let config = Config::for_root(tmp.path());
        let ctx = RequestContext::from_session(&config, &Session::default());
        assert!(ctx.content_set.is_none());
        assert_eq!(ctx.default_limit, 10);
    }

    #[test]
    fn test_context_resolves_export() {
        let tmp = TempDir::new().unwrap();
        let config = Config::for_root(tmp.path());
        std::fs::create_dir_all(crate::store::export_content_dir(&config, "Docs")).unwrap();
        let ctx = RequestContext::for_content_set(&config, "Docs");
        assert_eq!(ctx.content_set.as_ref().map(ContentSet::name), Some("Docs"));
    }
}
