//! Browser Collaborators
//!
//! web-sys implementations of the correlator's collaborator traits.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use js_sys::{Function, Object, Reflect};
use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use course_checkout_api::{BillingClient, CachedQuery};
use course_checkout_core::services::Task;
use course_checkout_core::{
    Analytics, AnalyticsEvent, IdentityCheck, LoginPrompt, Navigator, Notifier, Scheduler, UrlParams, WidgetConfig,
};

const TOAST_DURATION: Duration = Duration::from_secs(5);

thread_local! {
    static PAGE_QUERIES: RefCell<Option<Rc<CachedQuery<BillingClient>>>> = const { RefCell::new(None) };
}

/// Query cache shared by every button on the page
pub fn page_queries(config: &WidgetConfig, token: Option<String>) -> Rc<CachedQuery<BillingClient>> {
    PAGE_QUERIES.with(|cell| {
        cell.borrow_mut()
            .get_or_insert_with(|| {
                let client = BillingClient::from_config(config).with_token(token);
                Rc::new(CachedQuery::new(client, config.query_ttl()))
            })
            .clone()
    })
}

fn current_url() -> Option<web_sys::Url> {
    let href = web_sys::window()?.location().href().ok()?;
    web_sys::Url::new(&href).ok()
}

/// The page's own address
pub struct BrowserUrl;

impl UrlParams for BrowserUrl {
    fn get(&self, name: &str) -> Option<String> {
        current_url()?.search_params().get(name)
    }

    fn delete(&self, name: &str) {
        let Some(url) = current_url() else {
            return;
        };
        url.search_params().delete(name);

        // replaceState keeps the page and leaves no history entry to go back to
        let replaced = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|w| w.history())
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url.href())));
        if let Err(err) = replaced {
            tracing::warn!(param = name, error = ?err, "Failed to strip URL parameter");
        }
    }
}

pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &str) {
        let result = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|w| w.location().set_href(url));
        if let Err(err) = result {
            tracing::error!(%url, error = ?err, "Navigation failed");
        }
    }
}

/// Google Analytics through the page's global `gtag`, if the script loaded
pub struct GtagAnalytics;

fn gtag() -> Option<Function> {
    let window = web_sys::window()?;
    Reflect::get(&window, &JsValue::from_str("gtag"))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

impl Analytics for GtagAnalytics {
    fn is_available(&self) -> bool {
        gtag().is_some()
    }

    fn emit(&self, event: AnalyticsEvent, on_complete: Option<Task>) {
        let Some(gtag) = gtag() else {
            tracing::warn!(action = %event.action, "gtag unavailable, event dropped");
            return;
        };

        let params = Object::new();
        let set = |key: &str, value: &JsValue| Reflect::set(&params, &JsValue::from_str(key), value);
        let built = set("event_category", &JsValue::from_str(&event.category))
            .and_then(|_| set("event_label", &JsValue::from_str(&event.label)))
            .and_then(|_| match on_complete {
                Some(callback) => set("event_callback", &Closure::once_into_js(move || callback())),
                None => Ok(true),
            });
        if let Err(err) = built {
            // the fallback timer still redirects
            tracing::warn!(action = %event.action, error = ?err, "Failed to build gtag parameters");
            return;
        }

        let result = gtag.call3(
            &JsValue::NULL,
            &JsValue::from_str("event"),
            &JsValue::from_str(&event.action),
            &params,
        );
        if let Err(err) = result {
            tracing::warn!(action = %event.action, error = ?err, "gtag call failed");
        }
    }
}

pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        set_timeout(task, delay);
    }
}

/// Signed in when the auth cookie is present and non-empty
pub struct CookieIdentity {
    cookie: String,
}

impl CookieIdentity {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self { cookie: cookie.into() }
    }

    /// Value of the auth cookie, used as the API bearer token
    pub fn token(&self) -> Option<String> {
        let document = web_sys::window()?.document()?;
        let cookies = document.dyn_into::<web_sys::HtmlDocument>().ok()?.cookie().ok()?;
        cookie_value(&cookies, &self.cookie)
    }
}

impl IdentityCheck for CookieIdentity {
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Look up `name` in a `document.cookie` string
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Error toast that clears itself
pub struct ToastNotifier {
    set_toast: WriteSignal<Option<String>>,
}

impl ToastNotifier {
    pub const fn new(set_toast: WriteSignal<Option<String>>) -> Self {
        Self { set_toast }
    }
}

impl Notifier for ToastNotifier {
    fn error(&self, message: &str) {
        self.set_toast.set(Some(message.to_string()));
        let set_toast = self.set_toast;
        set_timeout(move || set_toast.set(None), TOAST_DURATION);
    }
}

pub struct LoginPopup {
    set_open: WriteSignal<bool>,
}

impl LoginPopup {
    pub const fn new(set_open: WriteSignal<bool>) -> Self {
        Self { set_open }
    }
}

impl LoginPrompt for LoginPopup {
    fn open(&self) {
        self.set_open.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let cookies = "theme=dark; course_token=eyJhbGciOi; _ga=GA1.1";
        assert_eq!(cookie_value(cookies, "course_token").as_deref(), Some("eyJhbGciOi"));
        assert_eq!(cookie_value(cookies, "theme").as_deref(), Some("dark"));
        assert_eq!(cookie_value(cookies, "missing"), None);
        assert_eq!(cookie_value("course_token=", "course_token"), None);
        assert_eq!(cookie_value("", "course_token"), None);
    }
}
