//! # course-checkout-api
//!
//! HTTP implementations of the buy button's remote collaborators.
//!
//! | trait | endpoint |
//! |---|---|
//! | `PricingQuery` | `GET /v1-course-pricing/{courseId}` |
//! | `EnrollmentQuery` | `GET /v1-course-progress/{courseId}` |
//! | `CheckoutSessions` | `POST /v1-create-checkout-session` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use course_checkout_api::{BillingClient, CachedQuery};
//! use course_checkout_core::{CourseId, PricingQuery, WidgetConfig};
//!
//! let config = WidgetConfig::from_json(r#"{"courseAppUrl": "https://app.example.com"}"#)?;
//! let client = BillingClient::from_config(&config).with_token(Some("jwt".into()));
//! let queries = CachedQuery::new(client, config.query_ttl());
//!
//! let pricing = queries.pricing(&CourseId::new("sql")).await?;
//! ```

mod cache;
mod client;

pub use cache::CachedQuery;
pub use client::{api_error, BillingClient, CHECKOUT_SESSION_PATH, ENROLLMENT_PATH, PRICING_PATH};
