//! End-to-end purchase flows against in-memory collaborators

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::channel::oneshot;

use course_checkout_core::analytics::{BEGIN_CHECKOUT, PURCHASE_CANCELED, PURCHASE_COMPLETE};
use course_checkout_core::mock::MockEnvironment;
use course_checkout_core::{
    CheckoutError, CheckoutSessionRequest, CheckoutSessionResponse, CheckoutSessions, ClickOutcome, Correlator,
    CourseId, EnrollmentStatus, Initiation, PurchaseOutcome, PurchaseState, Result, WidgetConfig,
};

const CHECKOUT_URL: &str = "https://pay.example/cs_test_1";

fn correlator(env: &MockEnvironment) -> Correlator {
    Correlator::new(
        CourseId::new("sql"),
        WidgetConfig::new("https://app.example.com"),
        env.collaborators(),
    )
}

fn session() -> Result<CheckoutSessionResponse> {
    Ok(CheckoutSessionResponse {
        checkout_url: CHECKOUT_URL.into(),
    })
}

#[tokio::test]
async fn intent_param_removed_even_when_signed_out() {
    let env = MockEnvironment::new().with_params(&[("purchase", "1")]);

    let report = correlator(&env).mount().await;

    assert_eq!(report.initiation, Some(Initiation::Unauthenticated));
    assert_eq!(env.url.deletions(), vec!["purchase".to_string()]);
    assert!(env.checkout.requests().is_empty());
    // auto-trigger never pops up a login
    assert_eq!(env.login.times_opened(), 0);
    assert!(env.notifier.errors().is_empty());
}

#[tokio::test]
async fn intent_param_starts_checkout_for_signed_in_user() {
    let env = MockEnvironment::new()
        .signed_in()
        .without_analytics()
        .with_params(&[("purchase", "1")]);
    env.checkout.push(session());

    let report = correlator(&env).mount().await;

    assert_eq!(
        report.initiation,
        Some(Initiation::Redirecting { checkout_url: CHECKOUT_URL.into() })
    );
    assert_eq!(env.url.deletions(), vec!["purchase".to_string()]);

    let requests = env.checkout.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].success.as_deref(), Some("/courses/sql?success=1"));
    assert_eq!(requests[0].cancel.as_deref(), Some("/courses/sql?success=0"));
}

#[tokio::test]
async fn intent_param_other_values_are_left_alone() {
    let env = MockEnvironment::new().signed_in().with_params(&[("purchase", "0")]);

    let report = correlator(&env).mount().await;

    assert_eq!(report.initiation, None);
    assert!(env.url.contains("purchase"));
    assert!(env.checkout.requests().is_empty());
}

#[tokio::test]
async fn success_outcome_fires_complete_once() {
    let env = MockEnvironment::new().with_params(&[("success", "1")]);

    let report = correlator(&env).mount().await;

    assert_eq!(report.outcome, Some(PurchaseOutcome::Completed));
    assert_eq!(env.analytics.actions(), vec![PURCHASE_COMPLETE.to_string()]);
    assert_eq!(env.analytics.events()[0].label, "sql Course Purchase");
    assert!(!env.url.contains("success"));
}

#[tokio::test]
async fn other_outcome_fires_canceled_once() {
    for value in ["0", "", "nope"] {
        let env = MockEnvironment::new().with_params(&[("success", value)]);

        let report = correlator(&env).mount().await;

        assert_eq!(report.outcome, Some(PurchaseOutcome::Canceled));
        assert_eq!(env.analytics.actions(), vec![PURCHASE_CANCELED.to_string()]);
        assert_eq!(env.url.deletions(), vec!["success".to_string()]);
    }
}

#[tokio::test]
async fn no_outcome_no_events() {
    let env = MockEnvironment::new().signed_in().with_params(&[("ref", "newsletter")]);

    let report = correlator(&env).mount().await;

    assert_eq!(report.outcome, None);
    assert_eq!(report.initiation, None);
    assert!(env.analytics.events().is_empty());
    assert!(env.url.deletions().is_empty());
    assert!(env.url.contains("ref"));
}

#[tokio::test]
async fn outcome_param_removed_without_analytics() {
    let env = MockEnvironment::new().without_analytics().with_params(&[("success", "1")]);

    let report = correlator(&env).mount().await;

    assert_eq!(report.outcome, Some(PurchaseOutcome::Completed));
    assert!(!env.url.contains("success"));
}

#[tokio::test]
async fn remount_after_strip_is_idle() {
    let env = MockEnvironment::new()
        .signed_in()
        .without_analytics()
        .with_params(&[("purchase", "1"), ("success", "0")]);
    env.checkout.push(session());

    let first = correlator(&env).mount().await;
    assert!(first.outcome.is_some());
    assert!(first.initiation.is_some());

    // a fresh instance on the same page load, e.g. after back/forward navigation
    let second = correlator(&env).mount().await;
    assert_eq!(second.outcome, None);
    assert_eq!(second.initiation, None);
    assert!(!second.repeated);
    assert_eq!(env.checkout.requests().len(), 1);
}

#[tokio::test]
async fn success_without_analytics_redirects_immediately() {
    let env = MockEnvironment::new().signed_in().without_analytics();
    env.checkout.push(session());

    let result = correlator(&env).initiate_purchase().await;

    assert!(matches!(result, Initiation::Redirecting { .. }));
    assert_eq!(env.navigator.visits(), vec![CHECKOUT_URL.to_string()]);
    assert!(env.scheduler.delays().is_empty());
}

#[tokio::test]
async fn success_with_blocked_analytics_redirects_immediately() {
    let env = MockEnvironment::new().signed_in();
    env.analytics.set_available(false);
    env.checkout.push(session());

    correlator(&env).initiate_purchase().await;

    assert_eq!(env.navigator.visits(), vec![CHECKOUT_URL.to_string()]);
    assert!(env.analytics.events().is_empty());
}

#[tokio::test]
async fn analytics_callback_wins_race() {
    let env = MockEnvironment::new().signed_in();
    env.checkout.push(session());

    correlator(&env).initiate_purchase().await;

    assert_eq!(env.analytics.actions(), vec![BEGIN_CHECKOUT.to_string()]);
    assert_eq!(env.scheduler.delays(), vec![Duration::from_millis(3000)]);
    assert!(env.navigator.visits().is_empty());

    env.analytics.complete_all();
    env.scheduler.run_all();

    assert_eq!(env.navigator.visits(), vec![CHECKOUT_URL.to_string()]);
}

#[tokio::test]
async fn fallback_timer_wins_when_tracking_never_answers() {
    let env = MockEnvironment::new().signed_in();
    env.checkout.push(session());

    correlator(&env).initiate_purchase().await;
    env.scheduler.run_all();

    assert_eq!(env.navigator.visits(), vec![CHECKOUT_URL.to_string()]);

    // a late acknowledgement does not navigate twice
    env.analytics.complete_all();
    assert_eq!(env.navigator.visits().len(), 1);
}

#[tokio::test]
async fn click_signed_out_opens_login() {
    let env = MockEnvironment::new().with_params(&[("success", "1")]);

    let outcome = correlator(&env).click(None).await;

    assert_eq!(outcome, ClickOutcome::LoginRequested);
    assert_eq!(env.login.times_opened(), 1);
    assert!(env.checkout.requests().is_empty());
    assert!(env.url.deletions().is_empty());
}

#[tokio::test]
async fn click_enrolled_opens_course() {
    let env = MockEnvironment::new().signed_in();
    let enrollment = EnrollmentStatus::enrolled(Utc::now());

    let outcome = correlator(&env).click(Some(&enrollment)).await;

    assert_eq!(
        outcome,
        ClickOutcome::OpenedCourse { url: "https://app.example.com/sql".into() }
    );
    assert_eq!(env.navigator.visits(), vec!["https://app.example.com/sql".to_string()]);
    assert!(env.checkout.requests().is_empty());
}

#[tokio::test]
async fn click_not_enrolled_starts_checkout() {
    let env = MockEnvironment::new().signed_in().without_analytics();
    env.checkout.push(session());

    let outcome = correlator(&env).click(Some(&EnrollmentStatus::default())).await;

    assert_eq!(
        outcome,
        ClickOutcome::Purchase(Initiation::Redirecting { checkout_url: CHECKOUT_URL.into() })
    );
}

#[tokio::test]
async fn failed_command_notifies_and_reenables() {
    let env = MockEnvironment::new().signed_in();
    env.checkout.push(Err(CheckoutError::Api {
        status: 402,
        message: Some("card declined".into()),
    }));
    env.checkout.push(session());

    let correlator = correlator(&env);
    let result = correlator.click(None).await;

    assert_eq!(
        result,
        ClickOutcome::Purchase(Initiation::Failed { message: "card declined".into() })
    );
    assert_eq!(env.notifier.errors(), vec!["card declined".to_string()]);
    assert_eq!(correlator.state(), PurchaseState::Idle);
    assert!(env.navigator.visits().is_empty());
    assert!(env.scheduler.delays().is_empty());

    // control is usable again; nothing was retried behind the user's back
    assert_eq!(env.checkout.requests().len(), 1);
    let retry = correlator.initiate_purchase().await;
    assert!(matches!(retry, Initiation::Redirecting { .. }));
}

#[tokio::test]
async fn failed_command_without_message_uses_generic_text() {
    let env = MockEnvironment::new().signed_in();
    env.checkout.push(Err(CheckoutError::Api { status: 500, message: None }));

    correlator(&env).initiate_purchase().await;

    assert_eq!(
        env.notifier.errors(),
        vec![course_checkout_core::error::GENERIC_ERROR_MESSAGE.to_string()]
    );
}

/// Checkout command that answers only when the test releases it
struct GatedCheckout {
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    calls: RefCell<usize>,
}

#[async_trait(?Send)]
impl CheckoutSessions for GatedCheckout {
    async fn create_checkout_session(&self, _request: &CheckoutSessionRequest) -> Result<CheckoutSessionResponse> {
        *self.calls.borrow_mut() += 1;
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        session()
    }
}

#[tokio::test]
async fn concurrent_triggers_issue_one_command() {
    let env = MockEnvironment::new().signed_in().without_analytics().with_params(&[("purchase", "1")]);
    let (release, gate) = oneshot::channel();
    let checkout = Rc::new(GatedCheckout {
        gate: RefCell::new(Some(gate)),
        calls: RefCell::new(0),
    });

    let mut deps = env.collaborators();
    deps.checkout = checkout.clone();
    let correlator = Correlator::new(CourseId::new("sql"), WidgetConfig::new("https://app.example.com"), deps);

    let (mounted, clicked, ()) = futures::join!(correlator.mount(), correlator.click(None), async {
        let _ = release.send(());
    });

    assert!(matches!(mounted.initiation, Some(Initiation::Redirecting { .. })));
    assert_eq!(clicked, ClickOutcome::Purchase(Initiation::AlreadyPending));
    assert_eq!(*checkout.calls.borrow(), 1);
    assert_eq!(env.navigator.visits(), vec![CHECKOUT_URL.to_string()]);
}
