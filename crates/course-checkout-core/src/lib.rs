//! # course-checkout-core
//!
//! Platform-independent logic behind the course "Buy Button".
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Correlator                              │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────────────┐  │
//! │  │ UrlParams  │  │   Checkout   │  │ Analytics / Navigator /  │  │
//! │  │ (page URL) │──│   Sessions   │──│ Scheduler (redirect race)│  │
//! │  └────────────┘  └──────────────┘  └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every side effect goes through a collaborator trait in [`services`], so the
//! same state machine runs in the browser (see `course-checkout-web`) and in
//! tests (see [`mock`]).
//!
//! ## Flow
//!
//! 1. On mount, a `success` parameter left by the payment provider is turned
//!    into exactly one `purchase_complete` / `purchase_canceled` event and
//!    stripped from the address.
//! 2. A `purchase=1` parameter is stripped and starts checkout for a signed-in
//!    user.
//! 3. Once the checkout session exists, the browser is sent to the provider
//!    after the `begin_checkout` event is acknowledged, or after a fallback
//!    delay, whichever happens first.

pub mod analytics;
pub mod config;
pub mod correlator;
pub mod error;
pub mod mock;
pub mod model;
pub mod params;
pub mod presentation;
pub mod redirect;
pub mod services;

pub use analytics::AnalyticsEvent;
pub use config::WidgetConfig;
pub use correlator::{ClickOutcome, Correlator, Initiation, MountReport, PurchaseState};
pub use error::{CheckoutError, Result};
pub use model::{CheckoutSessionRequest, CheckoutSessionResponse, CourseId, CoursePricing, EnrollmentStatus};
pub use params::{PurchaseOutcome, UrlParams};
pub use presentation::{ButtonInputs, ButtonPhase, ButtonVariant, ButtonView, PriceDisplay};
pub use services::{
    Analytics, CheckoutSessions, Collaborators, EnrollmentQuery, IdentityCheck, LoginPrompt,
    Navigator, Notifier, PricingQuery, Scheduler,
};
