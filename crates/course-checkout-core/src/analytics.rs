//! Checkout Lifecycle Events

use serde::Serialize;

use crate::model::CourseId;

pub const BEGIN_CHECKOUT: &str = "begin_checkout";
pub const PURCHASE_COMPLETE: &str = "purchase_complete";
pub const PURCHASE_CANCELED: &str = "purchase_canceled";

const CHECKOUT_CATEGORY: &str = "course_checkout";
const PURCHASE_CATEGORY: &str = "course_purchase";

/// An analytics event as handed to the emitter
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalyticsEvent {
    pub action: String,
    pub category: String,
    pub label: String,
}

impl AnalyticsEvent {
    fn new(action: &str, category: &str, label: String) -> Self {
        Self {
            action: action.into(),
            category: category.into(),
            label,
        }
    }

    /// Checkout session created, about to leave for the provider
    pub fn begin_checkout(course: &CourseId) -> Self {
        Self::new(BEGIN_CHECKOUT, CHECKOUT_CATEGORY, format!("{course} Course Checkout"))
    }

    /// Provider redirected back with success
    pub fn purchase_complete(course: &CourseId) -> Self {
        Self::new(PURCHASE_COMPLETE, PURCHASE_CATEGORY, format!("{course} Course Purchase"))
    }

    /// Provider redirected back without a payment
    pub fn purchase_canceled(course: &CourseId) -> Self {
        Self::new(PURCHASE_CANCELED, PURCHASE_CATEGORY, format!("{course} Course Purchase"))
    }
}
