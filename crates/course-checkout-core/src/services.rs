//! Collaborator Interfaces
//!
//! Everything the correlator touches outside its own state: queries, the
//! checkout command, identity, analytics, navigation, timers and user-facing
//! notices. Implementations live in `course-checkout-api` (HTTP),
//! `course-checkout-web` (browser) and [`crate::mock`] (tests).
//!
//! The widget runs on a single UI thread, so none of these are `Send`.

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::analytics::AnalyticsEvent;
use crate::error::Result;
use crate::model::{CheckoutSessionRequest, CheckoutSessionResponse, CourseId, CoursePricing, EnrollmentStatus};
use crate::params::UrlParams;

/// Deferred work handed to analytics callbacks and timers
pub type Task = Box<dyn FnOnce()>;

/// Course pricing lookup (cached, idempotent)
#[async_trait(?Send)]
pub trait PricingQuery {
    async fn pricing(&self, course: &CourseId) -> Result<CoursePricing>;
}

/// Enrollment lookup for the current user (cached, idempotent)
#[async_trait(?Send)]
pub trait EnrollmentQuery {
    async fn enrollment(&self, course: &CourseId) -> Result<EnrollmentStatus>;
}

/// Creates hosted checkout sessions
#[async_trait(?Send)]
pub trait CheckoutSessions {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSessionResponse>;
}

/// "Is the current user signed in", answered synchronously
pub trait IdentityCheck {
    fn is_authenticated(&self) -> bool;
}

/// Analytics emitter
pub trait Analytics {
    /// Whether the tracking backend is loaded right now
    ///
    /// Blocked or late tracking scripts make this change at runtime.
    fn is_available(&self) -> bool {
        true
    }

    /// Fire `event`; `on_complete` runs once the backend acknowledges it
    fn emit(&self, event: AnalyticsEvent, on_complete: Option<Task>);
}

/// Full-page navigation
pub trait Navigator {
    fn navigate(&self, url: &str);
}

/// One-shot timers
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Task);
}

/// Transient user-visible notices
pub trait Notifier {
    fn error(&self, message: &str);
}

/// Login popup
pub trait LoginPrompt {
    fn open(&self);
}

/// Everything a [`crate::Correlator`] needs, passed in explicitly
#[derive(Clone)]
pub struct Collaborators {
    /// Shared page address; valid for the current page load only
    pub url: Rc<dyn UrlParams>,
    pub identity: Rc<dyn IdentityCheck>,
    pub checkout: Rc<dyn CheckoutSessions>,
    /// `None` when no analytics backend exists at all
    pub analytics: Option<Rc<dyn Analytics>>,
    pub navigator: Rc<dyn Navigator>,
    pub scheduler: Rc<dyn Scheduler>,
    pub notifier: Rc<dyn Notifier>,
    pub login: Rc<dyn LoginPrompt>,
}

impl Collaborators {
    /// Analytics backend, if one is present and loaded
    pub fn live_analytics(&self) -> Option<&Rc<dyn Analytics>> {
        self.analytics.as_ref().filter(|analytics| analytics.is_available())
    }
}
