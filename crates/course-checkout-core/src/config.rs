//! Widget Configuration
//!
//! Supplied at build time in the browser (see `course-checkout-web`), or from
//! the process environment / JSON elsewhere.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::model::CourseId;
use crate::params::{DEFAULT_INTENT_PARAM, DEFAULT_OUTCOME_PARAM};

const COURSE_ID_PLACEHOLDER: &str = "{courseId}";

/// Buy button configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Base of the billing/progress API; empty means same origin
    #[serde(default)]
    pub api_base_url: String,

    /// Course-consumption application (enrolled users go here)
    pub course_app_url: String,

    /// Page the provider redirects back to; `{courseId}` is substituted
    #[serde(default = "default_course_page_path")]
    pub course_page_path: String,

    /// Where the login popup sends the user
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Name of the "start checkout on load" parameter
    #[serde(default = "default_intent_param")]
    pub intent_param: String,

    /// Name of the "returned from provider" parameter
    #[serde(default = "default_outcome_param")]
    pub outcome_param: String,

    /// Delay before navigating when analytics never acknowledges
    #[serde(default = "default_redirect_fallback_ms")]
    pub redirect_fallback_ms: u64,

    /// Cookie whose presence means the user is signed in
    #[serde(default = "default_auth_cookie")]
    pub auth_cookie: String,

    /// Freshness of cached pricing/enrollment answers
    #[serde(default = "default_query_ttl_secs")]
    pub query_ttl_secs: u64,
}

fn default_course_page_path() -> String { format!("/courses/{COURSE_ID_PLACEHOLDER}") }
fn default_login_url() -> String { "/login".into() }
fn default_intent_param() -> String { DEFAULT_INTENT_PARAM.into() }
fn default_outcome_param() -> String { DEFAULT_OUTCOME_PARAM.into() }
const fn default_redirect_fallback_ms() -> u64 { 3000 }
fn default_auth_cookie() -> String { "course_token".into() }
const fn default_query_ttl_secs() -> u64 { 300 }

impl WidgetConfig {
    /// Config with defaults for everything but the course app URL
    pub fn new(course_app_url: impl Into<String>) -> Self {
        Self {
            api_base_url: String::new(),
            course_app_url: course_app_url.into(),
            course_page_path: default_course_page_path(),
            login_url: default_login_url(),
            intent_param: default_intent_param(),
            outcome_param: default_outcome_param(),
            redirect_fallback_ms: default_redirect_fallback_ms(),
            auth_cookie: default_auth_cookie(),
            query_ttl_secs: default_query_ttl_secs(),
        }
    }

    /// Build from a key lookup (`COURSE_APP_URL`, `API_BASE_URL`, `AUTH_COOKIE`)
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let course_app_url = lookup("COURSE_APP_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| CheckoutError::Config("COURSE_APP_URL not set".into()))?;

        let mut config = Self::new(course_app_url);
        if let Some(api_base_url) = lookup("API_BASE_URL") {
            config.api_base_url = api_base_url;
        }
        if let Some(cookie) = lookup("AUTH_COOKIE").filter(|c| !c.is_empty()) {
            config.auth_cookie = cookie;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON object (e.g. a `data-config` attribute)
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the widget cannot work with
    pub fn validate(&self) -> Result<()> {
        if !is_absolute_http(&self.course_app_url) {
            return Err(CheckoutError::Config(format!(
                "course app URL must be absolute http(s): {}",
                self.course_app_url
            )));
        }
        if self.intent_param.is_empty() || self.outcome_param.is_empty() {
            return Err(CheckoutError::Config("URL parameter names must not be empty".into()));
        }
        if self.intent_param == self.outcome_param {
            return Err(CheckoutError::Config(format!(
                "intent and outcome parameters share the name {}",
                self.intent_param
            )));
        }
        if self.redirect_fallback_ms == 0 {
            return Err(CheckoutError::Config("redirect fallback delay must be positive".into()));
        }
        Ok(())
    }

    pub const fn redirect_fallback(&self) -> Duration {
        Duration::from_millis(self.redirect_fallback_ms)
    }

    pub const fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_secs)
    }

    /// Course page the provider sends the user back to
    pub fn course_page_path(&self, course: &CourseId) -> String {
        self.course_page_path.replace(COURSE_ID_PLACEHOLDER, course.as_str())
    }

    /// Where an enrolled user goes instead of checkout
    pub fn course_app_url_for(&self, course: &CourseId) -> String {
        format!("{}/{}", self.course_app_url.trim_end_matches('/'), course)
    }
}

fn is_absolute_http(url: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_string())
    }

    #[test]
    fn test_defaults() {
        let config = WidgetConfig::new("https://app.example.com");
        assert_eq!(config.intent_param, "purchase");
        assert_eq!(config.outcome_param, "success");
        assert_eq!(config.redirect_fallback(), Duration::from_millis(3000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_vars() {
        let config = WidgetConfig::from_vars(lookup(&[
            ("COURSE_APP_URL", "https://app.example.com/"),
            ("API_BASE_URL", "https://api.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.auth_cookie, "course_token");
        assert_eq!(
            config.course_app_url_for(&CourseId::new("sql")),
            "https://app.example.com/sql"
        );
    }

    #[test]
    fn test_from_vars_requires_course_app_url() {
        let err = WidgetConfig::from_vars(lookup(&[("API_BASE_URL", "x")])).unwrap_err();
        assert!(matches!(err, CheckoutError::Config(_)));

        let err = WidgetConfig::from_vars(lookup(&[("COURSE_APP_URL", "/relative")])).unwrap_err();
        assert!(matches!(err, CheckoutError::Config(_)));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = WidgetConfig::from_json(
            r#"{"courseAppUrl": "https://app.example.com", "coursePagePath": "/learn/{courseId}/buy"}"#,
        )
        .unwrap();
        assert_eq!(config.course_page_path(&CourseId::new("sql")), "/learn/sql/buy");
        assert_eq!(config.query_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_validate_rejects_clashing_params() {
        let mut config = WidgetConfig::new("https://app.example.com");
        config.outcome_param = config.intent_param.clone();
        assert!(config.validate().is_err());

        let mut config = WidgetConfig::new("https://app.example.com");
        config.redirect_fallback_ms = 0;
        assert!(config.validate().is_err());
    }
}
