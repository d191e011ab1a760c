//! Page Address Parameters
//!
//! The two query parameters exchanged with external redirect-generating
//! systems (marketing links, the payment provider). Their names and values are
//! a wire contract.

/// Default name of the "start checkout on load" parameter
pub const DEFAULT_INTENT_PARAM: &str = "purchase";

/// Default name of the "returned from the payment provider" parameter
pub const DEFAULT_OUTCOME_PARAM: &str = "success";

const FLAG_SET: &str = "1";
const FLAG_UNSET: &str = "0";

/// Query parameters of the current page address
///
/// There is a single writer per page: deletes must not trigger a navigation.
pub trait UrlParams {
    /// Current value of `name`, if present
    fn get(&self, name: &str) -> Option<String>;

    /// Remove `name` from the address without reloading the page
    fn delete(&self, name: &str);
}

/// Value of the intent parameter that asks for checkout
pub fn is_purchase_intent(value: &str) -> bool {
    value == FLAG_SET
}

/// How a provider round trip ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Completed,
    Canceled,
}

impl PurchaseOutcome {
    /// `"1"` is success, anything else counts as a cancellation
    pub fn from_param(value: &str) -> Self {
        if value == FLAG_SET {
            PurchaseOutcome::Completed
        } else {
            PurchaseOutcome::Canceled
        }
    }

    pub const fn as_param(self) -> &'static str {
        match self {
            PurchaseOutcome::Completed => FLAG_SET,
            PurchaseOutcome::Canceled => FLAG_UNSET,
        }
    }
}

/// Append `name=value` to a path, keeping any query string and fragment
pub fn with_query_param(path: &str, name: &str, value: &str) -> String {
    let (base, fragment) = match path.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (path, None),
    };

    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut url = format!("{base}{separator}{name}={value}");
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}
