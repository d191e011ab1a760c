//! In-Memory Collaborators
//!
//! For tests and demos. Every double records what the correlator asked of it.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::analytics::AnalyticsEvent;
use crate::error::{CheckoutError, Result};
use crate::model::{CheckoutSessionRequest, CheckoutSessionResponse, CourseId, CoursePricing, EnrollmentStatus};
use crate::params::UrlParams;
use crate::services::{
    Analytics, CheckoutSessions, Collaborators, EnrollmentQuery, IdentityCheck, LoginPrompt, Navigator,
    Notifier, PricingQuery, Scheduler, Task,
};

/// Page address held in memory
#[derive(Default)]
pub struct MemoryUrlParams {
    params: RefCell<BTreeMap<String, String>>,
    deletions: RefCell<Vec<String>>,
}

impl MemoryUrlParams {
    pub fn set(&self, name: &str, value: &str) {
        self.params.borrow_mut().insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.borrow().contains_key(name)
    }

    /// Names passed to `delete`, in order
    pub fn deletions(&self) -> Vec<String> {
        self.deletions.borrow().clone()
    }
}

impl UrlParams for MemoryUrlParams {
    fn get(&self, name: &str) -> Option<String> {
        self.params.borrow().get(name).cloned()
    }

    fn delete(&self, name: &str) {
        self.params.borrow_mut().remove(name);
        self.deletions.borrow_mut().push(name.into());
    }
}

/// Identity check with a switchable answer
#[derive(Default)]
pub struct StaticIdentity {
    authenticated: Cell<bool>,
}

impl StaticIdentity {
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: Cell::new(authenticated),
        }
    }

    pub fn set(&self, authenticated: bool) {
        self.authenticated.set(authenticated);
    }
}

impl IdentityCheck for StaticIdentity {
    fn is_authenticated(&self) -> bool {
        self.authenticated.get()
    }
}

/// Analytics that records events and holds completion callbacks until told
pub struct RecordingAnalytics {
    available: Cell<bool>,
    events: RefCell<Vec<AnalyticsEvent>>,
    callbacks: RefCell<Vec<Task>>,
}

impl Default for RecordingAnalytics {
    fn default() -> Self {
        Self {
            available: Cell::new(true),
            events: RefCell::new(Vec::new()),
            callbacks: RefCell::new(Vec::new()),
        }
    }
}

impl RecordingAnalytics {
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.borrow().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.events.borrow().iter().map(|e| e.action.clone()).collect()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Acknowledge every emitted event
    pub fn complete_all(&self) {
        let callbacks: Vec<Task> = self.callbacks.borrow_mut().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl Analytics for RecordingAnalytics {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn emit(&self, event: AnalyticsEvent, on_complete: Option<Task>) {
        self.events.borrow_mut().push(event);
        if let Some(callback) = on_complete {
            self.callbacks.borrow_mut().push(callback);
        }
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    visits: RefCell<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        self.visits.borrow_mut().push(url.into());
    }
}

/// Timers that only fire when the test says so
#[derive(Default)]
pub struct ManualScheduler {
    tasks: RefCell<Vec<(Duration, Task)>>,
}

impl ManualScheduler {
    pub fn delays(&self) -> Vec<Duration> {
        self.tasks.borrow().iter().map(|(delay, _)| *delay).collect()
    }

    /// Fire the earliest-scheduled task, if any
    pub fn run_next(&self) {
        let task = {
            let mut tasks = self.tasks.borrow_mut();
            if tasks.is_empty() {
                return;
            }
            tasks.remove(0).1
        };
        task();
    }

    /// Fire every scheduled task
    pub fn run_all(&self) {
        let tasks: Vec<(Duration, Task)> = self.tasks.borrow_mut().drain(..).collect();
        for (_, task) in tasks {
            task();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        self.tasks.borrow_mut().push((delay, task));
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    errors: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.into());
    }
}

#[derive(Default)]
pub struct RecordingLoginPrompt {
    opened: Cell<usize>,
}

impl RecordingLoginPrompt {
    pub fn times_opened(&self) -> usize {
        self.opened.get()
    }
}

impl LoginPrompt for RecordingLoginPrompt {
    fn open(&self) {
        self.opened.set(self.opened.get() + 1);
    }
}

/// Checkout command answering from a script
#[derive(Default)]
pub struct ScriptedCheckout {
    responses: RefCell<VecDeque<Result<CheckoutSessionResponse>>>,
    requests: RefCell<Vec<CheckoutSessionRequest>>,
}

impl ScriptedCheckout {
    pub fn push(&self, response: Result<CheckoutSessionResponse>) {
        self.responses.borrow_mut().push_back(response);
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl CheckoutSessions for ScriptedCheckout {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSessionResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(CheckoutError::Network("no scripted response".into())))
    }
}

/// Pricing and enrollment answers that never change
pub struct StaticQueries {
    pricing: CoursePricing,
    enrollment: EnrollmentStatus,
    calls: Cell<usize>,
}

impl StaticQueries {
    pub fn new(pricing: CoursePricing, enrollment: EnrollmentStatus) -> Self {
        Self {
            pricing,
            enrollment,
            calls: Cell::new(0),
        }
    }

    /// Number of lookups served, both kinds together
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait(?Send)]
impl PricingQuery for StaticQueries {
    async fn pricing(&self, _course: &CourseId) -> Result<CoursePricing> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.pricing.clone())
    }
}

#[async_trait(?Send)]
impl EnrollmentQuery for StaticQueries {
    async fn enrollment(&self, _course: &CourseId) -> Result<EnrollmentStatus> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.enrollment.clone())
    }
}

/// A full set of doubles, signed out, analytics loaded, empty address
pub struct MockEnvironment {
    pub url: Rc<MemoryUrlParams>,
    pub identity: Rc<StaticIdentity>,
    pub checkout: Rc<ScriptedCheckout>,
    pub analytics: Rc<RecordingAnalytics>,
    pub navigator: Rc<RecordingNavigator>,
    pub scheduler: Rc<ManualScheduler>,
    pub notifier: Rc<RecordingNotifier>,
    pub login: Rc<RecordingLoginPrompt>,
    analytics_installed: bool,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            url: Rc::new(MemoryUrlParams::default()),
            identity: Rc::new(StaticIdentity::new(false)),
            checkout: Rc::new(ScriptedCheckout::default()),
            analytics: Rc::new(RecordingAnalytics::default()),
            navigator: Rc::new(RecordingNavigator::default()),
            scheduler: Rc::new(ManualScheduler::default()),
            notifier: Rc::new(RecordingNotifier::default()),
            login: Rc::new(RecordingLoginPrompt::default()),
            analytics_installed: true,
        }
    }

    #[must_use]
    pub fn signed_in(self) -> Self {
        self.identity.set(true);
        self
    }

    #[must_use]
    pub fn with_params(self, pairs: &[(&str, &str)]) -> Self {
        for (name, value) in pairs {
            self.url.set(name, value);
        }
        self
    }

    /// No analytics backend at all
    #[must_use]
    pub fn without_analytics(mut self) -> Self {
        self.analytics_installed = false;
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            url: self.url.clone(),
            identity: self.identity.clone(),
            checkout: self.checkout.clone(),
            analytics: self
                .analytics_installed
                .then(|| self.analytics.clone() as Rc<dyn Analytics>),
            navigator: self.navigator.clone(),
            scheduler: self.scheduler.clone(),
            notifier: self.notifier.clone(),
            login: self.login.clone(),
        }
    }
}
