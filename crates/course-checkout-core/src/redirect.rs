//! Provider Redirect
//!
//! After a checkout session is created, two paths race to send the browser to
//! the provider: the `begin_checkout` acknowledgement and a fallback timer for
//! when tracking is blocked. The first caller navigates; later calls are no-ops.

use std::cell::Cell;
use std::rc::Rc;

use crate::services::Navigator;

/// Navigation to one URL that happens at most once
#[derive(Clone)]
pub struct Redirect {
    inner: Rc<RedirectInner>,
}

struct RedirectInner {
    navigator: Rc<dyn Navigator>,
    url: String,
    done: Cell<bool>,
}

impl Redirect {
    pub fn new(navigator: Rc<dyn Navigator>, url: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RedirectInner {
                navigator,
                url: url.into(),
                done: Cell::new(false),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Navigate unless another path already did; returns whether this call won
    pub fn go(&self, via: &'static str) -> bool {
        if self.inner.done.replace(true) {
            tracing::debug!(via, "Redirect already issued");
            return false;
        }

        tracing::info!(via, checkout_url = %self.inner.url, "Redirecting to checkout");
        self.inner.navigator.navigate(&self.inner.url);
        true
    }

    pub fn is_done(&self) -> bool {
        self.inner.done.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingNavigator;

    #[test]
    fn test_first_navigation_wins() {
        let navigator = Rc::new(RecordingNavigator::default());
        let redirect = Redirect::new(navigator.clone(), "https://pay.example/cs_1");
        let racer = redirect.clone();

        assert_eq!(racer.url(), "https://pay.example/cs_1");
        assert!(!redirect.is_done());
        assert!(redirect.go("analytics"));
        assert!(!racer.go("timer"));
        assert!(racer.is_done());
        assert_eq!(navigator.visits(), vec!["https://pay.example/cs_1".to_string()]);
    }
}
