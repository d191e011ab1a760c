//! Buy Button Component

use std::rc::{Rc, Weak};

use leptos::prelude::*;
use leptos::task::spawn_local;

use course_checkout_api::{BillingClient, CachedQuery};
use course_checkout_core::{
    ButtonInputs, ButtonVariant, ButtonView, Collaborators, Correlator, CourseId, CoursePricing, EnrollmentQuery,
    EnrollmentStatus, IdentityCheck, PriceDisplay, PricingQuery, PurchaseOutcome, WidgetConfig,
};

use crate::browser::{
    page_queries, BrowserNavigator, BrowserUrl, CookieIdentity, GtagAnalytics, LoginPopup, TimeoutScheduler,
    ToastNotifier,
};

/// Course buy button
///
/// Each instance owns its own purchase flow; pricing and enrollment answers
/// are shared page-wide.
#[component]
pub fn BuyButton(
    course_id: String,
    #[prop(optional)] variant: ButtonVariant,
    config: WidgetConfig,
) -> impl IntoView {
    let course = CourseId::new(course_id);
    let identity = Rc::new(CookieIdentity::new(config.auth_cookie.clone()));
    let signed_in = identity.is_authenticated();
    let queries = page_queries(&config, identity.token());
    let login_url = config.login_url.clone();

    let (pricing, set_pricing) = signal(None::<CoursePricing>);
    let (pricing_loading, set_pricing_loading) = signal(true);
    let (enrollment, set_enrollment) = signal(None::<EnrollmentStatus>);
    let (enrollment_loading, set_enrollment_loading) = signal(signed_in);
    let (pending, set_pending) = signal(false);
    let (toast, set_toast) = signal(None::<String>);
    let (login_open, set_login_open) = signal(false);

    let deps = Collaborators {
        url: Rc::new(BrowserUrl),
        identity,
        checkout: Rc::new(queries.inner().clone()),
        analytics: Some(Rc::new(GtagAnalytics)),
        navigator: Rc::new(BrowserNavigator),
        scheduler: Rc::new(TimeoutScheduler),
        notifier: Rc::new(ToastNotifier::new(set_toast)),
        login: Rc::new(LoginPopup::new(set_login_open)),
    };
    let correlator = Rc::new(Correlator::new(course.clone(), config, deps));
    correlator.on_state_change(move |state| set_pending.set(state.is_busy()));

    // pricing is public; enrollment only exists for signed-in users
    spawn_local({
        let queries = queries.clone();
        let course = course.clone();
        async move {
            match queries.pricing(&course).await {
                Ok(value) => set_pricing.set(Some(value)),
                Err(err) => tracing::error!(course_id = %course, error = %err, "Failed to load pricing"),
            }
            set_pricing_loading.set(false);
        }
    });
    if signed_in {
        spawn_local(load_enrollment(queries.clone(), course.clone(), set_enrollment, set_enrollment_loading));

        // every button for this course refreshes, not just the one that read the outcome
        let weak: Weak<CachedQuery<BillingClient>> = Rc::downgrade(&queries);
        let watched = course.clone();
        queries.on_invalidate(move |invalidated| {
            if *invalidated != watched {
                return;
            }
            if let Some(queries) = weak.upgrade() {
                spawn_local(load_enrollment(queries, watched.clone(), set_enrollment, set_enrollment_loading));
            }
        });
    }

    // the component body runs once per mount
    spawn_local({
        let correlator = correlator.clone();
        async move {
            let report = correlator.mount().await;
            if signed_in && report.outcome == Some(PurchaseOutcome::Completed) {
                queries.invalidate(&course);
            }
        }
    });

    let on_click = move |_| {
        let correlator = correlator.clone();
        let enrollment = enrollment.get_untracked();
        spawn_local(async move {
            let outcome = correlator.click(enrollment.as_ref()).await;
            tracing::debug!(?outcome, "Buy click handled");
        });
    };

    let button_view = Memo::new(move |_| {
        let pricing = pricing.get();
        ButtonView::derive(
            variant,
            &ButtonInputs {
                pricing_loading: pricing_loading.get(),
                enrollment_loading: enrollment_loading.get(),
                enrolled: enrollment.with(|e| e.as_ref().is_some_and(EnrollmentStatus::is_enrolled)),
                pricing: pricing.as_ref(),
                pending: pending.get(),
            },
        )
    });

    let class = move || button_view.get().class;
    let label = move || button_view.get().label;
    let disabled = move || button_view.get().disabled;
    let price = move || button_view.get().price.map(|price| view! { <PriceTag price=price /> });

    let body = match variant {
        ButtonVariant::Main => view! {
            <div class=class>
                <div class="buy-button__price">{price}</div>
                <button class="buy-button__cta" disabled=disabled on:click=on_click>
                    {label}
                </button>
                <p class="buy-button__note">"Lifetime access · Free updates"</p>
            </div>
        }
        .into_any(),
        ButtonVariant::Floating => view! {
            <div class=class>
                <div class="buy-button__bar">
                    <span class="buy-button__price">{price}</span>
                    <button class="buy-button__cta" disabled=disabled on:click=on_click>
                        {label}
                    </button>
                </div>
            </div>
        }
        .into_any(),
        ButtonVariant::TopNav => view! {
            <button class=class disabled=disabled on:click=on_click>
                {label}
            </button>
        }
        .into_any(),
    };

    view! {
        {body}
        <Show when=move || toast.get().is_some()>
            <div class="buy-button-toast" role="alert">
                {move || toast.get().unwrap_or_default()}
            </div>
        </Show>
        <Show when=move || login_open.get()>
            <LoginDialog login_url=login_url.clone() set_open=set_login_open />
        </Show>
    }
}

async fn load_enrollment(
    queries: Rc<CachedQuery<BillingClient>>,
    course: CourseId,
    set_enrollment: WriteSignal<Option<EnrollmentStatus>>,
    set_loading: WriteSignal<bool>,
) {
    set_loading.set(true);
    match queries.enrollment(&course).await {
        Ok(status) => set_enrollment.set(Some(status)),
        Err(err) => tracing::error!(course_id = %course, error = %err, "Failed to load enrollment"),
    }
    set_loading.set(false);
}

#[component]
fn PriceTag(price: PriceDisplay) -> impl IntoView {
    view! {
        <span class="buy-button__price-current">{price.current}</span>
        {price.original.map(|original| view! { <s class="buy-button__price-original">{original}</s> })}
        {price
            .discount_percent
            .map(|pct| view! { <span class="buy-button__badge">{format!("{pct}% off")}</span> })}
    }
}

#[component]
fn LoginDialog(login_url: String, set_open: WriteSignal<bool>) -> impl IntoView {
    view! {
        <div class="buy-button-login" role="dialog" aria-modal="true">
            <p>"Log in or create a free account to buy this course."</p>
            <a class="btn btn-primary" href=login_url>"Log in"</a>
            <button class="btn" on:click=move |_| set_open.set(false)>"Close"</button>
        </div>
    }
}
