//! Redirect & Analytics Correlator
//!
//! Ties the page address, the checkout-session command and analytics together
//! for one buy-button instance.
//!
//! ```text
//!  mount ──▶ outcome param? ──▶ ReportingOutcome ──▶ Idle
//!    │
//!    └────▶ intent param == "1"? ──▶ InitiatingPurchase ──▶ AwaitingProviderRedirect
//!                                          │ (failure)              │ (navigation issued)
//!                                          ▼                        ▼
//!                                         Idle                     Idle
//! ```
//!
//! Once navigation has been handed to the browser the instance is idle again,
//! so a page restored from the back/forward cache (or a failed navigation)
//! leaves a usable button behind.
//!
//! Mount-time parameters are read once per instance and stripped as soon as
//! they are interpreted, so re-renders and back/forward navigation never
//! replay them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use uuid::Uuid;

use crate::analytics::AnalyticsEvent;
use crate::config::WidgetConfig;
use crate::model::{CheckoutSessionRequest, CourseId, EnrollmentStatus};
use crate::params::{is_purchase_intent, with_query_param, PurchaseOutcome};
use crate::redirect::Redirect;
use crate::services::Collaborators;

/// Lifecycle of the purchase flow for one instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseState {
    Idle,
    /// Outcome parameter being turned into an analytics event
    ReportingOutcome,
    /// Checkout-session command in flight
    InitiatingPurchase,
    /// Session created; waiting for the analytics acknowledgement or the fallback timer
    AwaitingProviderRedirect,
}

impl PurchaseState {
    /// The buy control is disabled in these states
    pub const fn is_busy(self) -> bool {
        matches!(self, PurchaseState::InitiatingPurchase | PurchaseState::AwaitingProviderRedirect)
    }
}

impl std::fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseState::Idle => write!(f, "idle"),
            PurchaseState::ReportingOutcome => write!(f, "reporting_outcome"),
            PurchaseState::InitiatingPurchase => write!(f, "initiating_purchase"),
            PurchaseState::AwaitingProviderRedirect => write!(f, "awaiting_provider_redirect"),
        }
    }
}

/// Result of one run of the purchase-initiation procedure
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Initiation {
    /// No signed-in user; nothing happened
    Unauthenticated,
    /// Another checkout session is already being created
    AlreadyPending,
    /// Session created, redirect under way
    Redirecting { checkout_url: String },
    /// Command failed; the user was notified
    Failed { message: String },
}

/// What a click on the buy control led to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Signed out: login popup opened
    LoginRequested,
    /// Already enrolled: sent to the course application
    OpenedCourse { url: String },
    /// Purchase-initiation procedure ran
    Purchase(Initiation),
}

/// What mounting found in the page address
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MountReport {
    /// Provider outcome that was reported, if any
    pub outcome: Option<PurchaseOutcome>,

    /// Result of an intent-triggered purchase, if the intent parameter was set
    pub initiation: Option<Initiation>,

    /// This instance had already been mounted; nothing was evaluated
    pub repeated: bool,
}

type StateListener = Box<dyn Fn(PurchaseState)>;

/// Current state and its observer
///
/// Shared with the redirect callbacks, which fire after `initiate_purchase`
/// has returned.
struct Lifecycle {
    /// Tags log lines when several buttons share a page
    instance: Uuid,
    course: CourseId,
    state: Cell<PurchaseState>,
    listener: RefCell<Option<StateListener>>,
}

impl Lifecycle {
    fn set(&self, next: PurchaseState) {
        let previous = self.state.replace(next);
        if previous == next {
            return;
        }

        tracing::debug!(
            instance = %self.instance,
            course_id = %self.course,
            from = %previous,
            to = %next,
            "Purchase state changed"
        );
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener(next);
        }
    }
}

/// Purchase flow for one buy-button instance
pub struct Correlator {
    course: CourseId,
    config: WidgetConfig,
    deps: Collaborators,
    lifecycle: Rc<Lifecycle>,
    mounted: Cell<bool>,
}

impl Correlator {
    pub fn new(course: CourseId, config: WidgetConfig, deps: Collaborators) -> Self {
        let lifecycle = Rc::new(Lifecycle {
            instance: Uuid::new_v4(),
            course: course.clone(),
            state: Cell::new(PurchaseState::Idle),
            listener: RefCell::new(None),
        });
        Self {
            course,
            config,
            deps,
            lifecycle,
            mounted: Cell::new(false),
        }
    }

    pub fn state(&self) -> PurchaseState {
        self.lifecycle.state.get()
    }

    /// Whether the buy control should be disabled
    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    /// Register the callback that mirrors state into the UI
    pub fn on_state_change(&self, listener: impl Fn(PurchaseState) + 'static) {
        *self.lifecycle.listener.borrow_mut() = Some(Box::new(listener));
    }

    fn set_state(&self, next: PurchaseState) {
        self.lifecycle.set(next);
    }

    /// Evaluate the page address; runs at most once per instance
    ///
    /// The outcome parameter is reported first and synchronously; an intent
    /// parameter then starts the purchase-initiation procedure.
    pub async fn mount(&self) -> MountReport {
        if self.mounted.replace(true) {
            tracing::debug!(instance = %self.lifecycle.instance, "Already mounted, ignoring address");
            return MountReport {
                repeated: true,
                ..MountReport::default()
            };
        }

        let outcome = self.report_outcome();

        let initiation = match self.deps.url.get(&self.config.intent_param) {
            Some(value) if is_purchase_intent(&value) => {
                self.deps.url.delete(&self.config.intent_param);
                tracing::info!(course_id = %self.course, "Purchase intent found in address");
                Some(self.initiate_purchase().await)
            }
            _ => None,
        };

        MountReport {
            outcome,
            initiation,
            repeated: false,
        }
    }

    fn report_outcome(&self) -> Option<PurchaseOutcome> {
        let value = self.deps.url.get(&self.config.outcome_param)?;
        let outcome = PurchaseOutcome::from_param(&value);

        self.set_state(PurchaseState::ReportingOutcome);

        let event = match outcome {
            PurchaseOutcome::Completed => AnalyticsEvent::purchase_complete(&self.course),
            PurchaseOutcome::Canceled => AnalyticsEvent::purchase_canceled(&self.course),
        };
        match self.deps.live_analytics() {
            Some(analytics) => analytics.emit(event, None),
            None => tracing::debug!(action = %event.action, "Analytics unavailable, outcome not tracked"),
        }

        self.deps.url.delete(&self.config.outcome_param);
        tracing::info!(course_id = %self.course, ?outcome, "Reported checkout outcome");

        self.set_state(PurchaseState::Idle);
        Some(outcome)
    }

    /// Handle a click on the buy control
    ///
    /// `enrollment` is the latest enrollment answer, if it has arrived.
    pub async fn click(&self, enrollment: Option<&EnrollmentStatus>) -> ClickOutcome {
        if !self.deps.identity.is_authenticated() {
            tracing::debug!(course_id = %self.course, "Buy clicked while signed out");
            self.deps.login.open();
            return ClickOutcome::LoginRequested;
        }

        if enrollment.is_some_and(EnrollmentStatus::is_enrolled) {
            let url = self.config.course_app_url_for(&self.course);
            tracing::info!(course_id = %self.course, %url, "Already enrolled, opening course");
            self.deps.navigator.navigate(&url);
            return ClickOutcome::OpenedCourse { url };
        }

        ClickOutcome::Purchase(self.initiate_purchase().await)
    }

    /// Create a checkout session and send the browser to the provider
    ///
    /// Signed-out users are ignored silently; this path also serves the
    /// program-driven trigger, which must not pop anything up. At most one
    /// command is in flight per instance, and no new one starts until the
    /// previous session's redirect has been issued.
    pub async fn initiate_purchase(&self) -> Initiation {
        if !self.deps.identity.is_authenticated() {
            tracing::debug!(course_id = %self.course, "Not signed in, skipping checkout");
            return Initiation::Unauthenticated;
        }

        if self.is_busy() {
            tracing::warn!(
                instance = %self.lifecycle.instance,
                state = %self.state(),
                "Checkout already in progress"
            );
            return Initiation::AlreadyPending;
        }

        self.set_state(PurchaseState::InitiatingPurchase);
        let request = self.checkout_request();

        match self.deps.checkout.create_checkout_session(&request).await {
            Ok(session) => {
                self.set_state(PurchaseState::AwaitingProviderRedirect);
                self.redirect_to_checkout(&session.checkout_url);
                Initiation::Redirecting {
                    checkout_url: session.checkout_url,
                }
            }
            Err(err) => {
                tracing::error!(course_id = %self.course, error = %err, "Failed to create checkout session");
                let message = err.user_message();
                self.deps.notifier.error(&message);
                self.set_state(PurchaseState::Idle);
                Initiation::Failed { message }
            }
        }
    }

    /// Success and cancel targets differ only by the outcome parameter
    pub fn checkout_request(&self) -> CheckoutSessionRequest {
        let page = self.config.course_page_path(&self.course);
        let outcome = &self.config.outcome_param;

        CheckoutSessionRequest {
            course_id: self.course.clone(),
            success: Some(with_query_param(&page, outcome, PurchaseOutcome::Completed.as_param())),
            cancel: Some(with_query_param(&page, outcome, PurchaseOutcome::Canceled.as_param())),
        }
    }

    fn redirect_to_checkout(&self, checkout_url: &str) {
        let redirect = Redirect::new(self.deps.navigator.clone(), checkout_url);

        let Some(analytics) = self.deps.live_analytics() else {
            leave_for_provider(&redirect, &self.lifecycle, "direct");
            return;
        };

        let (via_event, lifecycle) = (redirect.clone(), self.lifecycle.clone());
        analytics.emit(
            AnalyticsEvent::begin_checkout(&self.course),
            Some(Box::new(move || leave_for_provider(&via_event, &lifecycle, "analytics"))),
        );

        // tracking may be blocked and never call back
        let lifecycle = self.lifecycle.clone();
        self.deps.scheduler.schedule(
            self.config.redirect_fallback(),
            Box::new(move || leave_for_provider(&redirect, &lifecycle, "fallback_timer")),
        );
    }
}

/// Only the winning path touches the state; a late loser must not reset a newer attempt
fn leave_for_provider(redirect: &Redirect, lifecycle: &Lifecycle, via: &'static str) {
    if redirect.go(via) {
        lifecycle.set(PurchaseState::Idle);
    }
}
