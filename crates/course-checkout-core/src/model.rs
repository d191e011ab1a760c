//! Course Checkout Model
//!
//! Pricing, enrollment and checkout-session types exchanged with the billing API.
//! Field names follow the API's camelCase JSON.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Course identifier (slug, e.g. `sql`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl CourseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pricing snapshot for a course
///
/// Read-only; the widget never mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePricing {
    /// List price
    pub full_price: Decimal,

    /// Possibly discounted regional price
    pub regional_price: Decimal,

    /// Whether the server decided the regional price applies to this visitor
    #[serde(default)]
    pub is_eligible_for_discount: bool,
}

impl CoursePricing {
    /// Price the visitor actually pays
    pub fn effective_price(&self) -> Decimal {
        if self.has_discount() {
            self.regional_price
        } else {
            self.full_price
        }
    }

    /// True when a strictly lower regional price applies
    pub fn has_discount(&self) -> bool {
        self.is_eligible_for_discount && self.regional_price < self.full_price
    }

    /// Discount rounded to whole percent
    pub fn discount_percent(&self) -> Option<u32> {
        if !self.has_discount() || self.full_price <= Decimal::ZERO {
            return None;
        }

        let saved = (self.full_price - self.regional_price) / self.full_price;
        (saved * Decimal::ONE_HUNDRED).round().to_u32()
    }
}

/// Enrollment of the current user in a course
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatus {
    /// When the user got access; absent means not enrolled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl EnrollmentStatus {
    pub fn enrolled(at: DateTime<Utc>) -> Self {
        Self { enrolled_at: Some(at) }
    }

    pub const fn is_enrolled(&self) -> bool {
        self.enrolled_at.is_some()
    }
}

/// Body of the create-checkout-session call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    /// Course being purchased
    pub course_id: CourseId,

    /// Path the provider sends the user to after paying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,

    /// Path the provider sends the user to after backing out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<String>,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    /// Hosted checkout page to redirect the browser to
    pub checkout_url: String,
}
