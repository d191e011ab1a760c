//! Buy Button Presentation
//!
//! Pure derivation of what a button variant shows from query and checkout
//! state. No business logic lives here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::CoursePricing;

/// Where and how the button is rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ButtonVariant {
    /// Large card with price and call to action
    #[default]
    Main,
    /// Sticky bar at the bottom of the page
    Floating,
    /// Compact button in the top navigation
    TopNav,
}

impl ButtonVariant {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "floating" => ButtonVariant::Floating,
            "top-nav" | "topnav" | "top_nav" => ButtonVariant::TopNav,
            _ => ButtonVariant::Main,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ButtonVariant::Main => "main",
            ButtonVariant::Floating => "floating",
            ButtonVariant::TopNav => "top-nav",
        }
    }

    const fn shows_price(self) -> bool {
        !matches!(self, ButtonVariant::TopNav)
    }

    const fn shows_discount_badge(self) -> bool {
        matches!(self, ButtonVariant::Main)
    }
}

/// State consumed by the presentation layer
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonInputs<'a> {
    pub pricing_loading: bool,
    pub enrollment_loading: bool,
    pub enrolled: bool,
    pub pricing: Option<&'a CoursePricing>,
    /// A checkout session is being created or the redirect is under way
    pub pending: bool,
}

/// Which face of the button is shown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonPhase {
    Loading,
    Enrolled,
    Pending,
    Purchasable,
}

/// Formatted prices
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceDisplay {
    /// What the visitor pays
    pub current: String,
    /// List price, struck through, when a discount applies
    pub original: Option<String>,
    pub discount_percent: Option<u32>,
}

impl PriceDisplay {
    pub fn from_pricing(pricing: &CoursePricing) -> Self {
        Self {
            current: format_usd(pricing.effective_price()),
            original: pricing.has_discount().then(|| format_usd(pricing.full_price)),
            discount_percent: pricing.discount_percent(),
        }
    }
}

/// Everything a variant needs to render
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonView {
    pub variant: ButtonVariant,
    pub phase: ButtonPhase,
    pub label: &'static str,
    pub disabled: bool,
    pub price: Option<PriceDisplay>,
    pub class: String,
}

impl ButtonView {
    /// Derive the view for `variant`
    pub fn derive(variant: ButtonVariant, inputs: &ButtonInputs<'_>) -> Self {
        let phase = if inputs.pricing_loading || inputs.enrollment_loading {
            ButtonPhase::Loading
        } else if inputs.enrolled {
            ButtonPhase::Enrolled
        } else if inputs.pending {
            ButtonPhase::Pending
        } else {
            ButtonPhase::Purchasable
        };

        let label = match phase {
            ButtonPhase::Loading => "Loading…",
            ButtonPhase::Enrolled => "Start Learning",
            ButtonPhase::Pending => "Please wait…",
            ButtonPhase::Purchasable => "Buy Now",
        };

        let price = match phase {
            ButtonPhase::Purchasable | ButtonPhase::Pending if variant.shows_price() => {
                inputs.pricing.map(|pricing| {
                    let mut display = PriceDisplay::from_pricing(pricing);
                    if !variant.shows_discount_badge() {
                        display.discount_percent = None;
                    }
                    display
                })
            }
            _ => None,
        };

        let state_class = match phase {
            ButtonPhase::Loading => "is-loading",
            ButtonPhase::Enrolled => "is-enrolled",
            ButtonPhase::Pending => "is-pending",
            ButtonPhase::Purchasable => "is-ready",
        };

        Self {
            variant,
            phase,
            label,
            disabled: matches!(phase, ButtonPhase::Loading | ButtonPhase::Pending),
            price,
            class: format!("buy-button buy-button--{} {state_class}", variant.as_str()),
        }
    }
}

/// USD amount: whole numbers without cents, otherwise two decimals
pub fn format_usd(amount: Decimal) -> String {
    let amount = amount.round_dp(2);
    if amount.fract().is_zero() {
        format!("${}", amount.trunc())
    } else {
        format!("${amount:.2}")
    }
}
