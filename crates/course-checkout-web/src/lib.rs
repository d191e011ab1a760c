//! Course Checkout Web Frontend
//!
//! Leptos-based WASM buy button, mounted into host pages by element id.
//!
//! ```js
//! import init, { mount_buy_button } from "./course_checkout_web.js";
//! await init();
//! mount_buy_button("buy-main", "sql", "main");
//! mount_buy_button("buy-nav", "sql", "top-nav");
//! ```

mod browser;
mod components;
mod config;

pub use components::BuyButton;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use course_checkout_core::{ButtonVariant, WidgetConfig};

/// WASM entry point
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// Mount a buy button using the configuration baked in at build time
#[wasm_bindgen]
pub fn mount_buy_button(element_id: &str, course_id: &str, variant: &str) -> Result<(), JsValue> {
    let config = config::build_config().map_err(|e| JsValue::from_str(&e.to_string()))?;
    mount(element_id, course_id, ButtonVariant::parse(variant), config)
}

/// Mount a buy button with a JSON configuration (e.g. from a `data-config` attribute)
#[wasm_bindgen]
pub fn mount_buy_button_with_config(
    element_id: &str,
    course_id: &str,
    variant: &str,
    config_json: &str,
) -> Result<(), JsValue> {
    let config = WidgetConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    mount(element_id, course_id, ButtonVariant::parse(variant), config)
}

fn mount(element_id: &str, course_id: &str, variant: ButtonVariant, config: WidgetConfig) -> Result<(), JsValue> {
    let parent = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(element_id))
        .ok_or_else(|| JsValue::from_str(&format!("element #{element_id} not found")))?
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| JsValue::from_str("mount target is not an HTML element"))?;

    tracing::info!(course_id, variant = variant.as_str(), "Mounting buy button");

    let course_id = course_id.to_string();
    leptos::mount::mount_to(parent, move || {
        view! { <BuyButton course_id=course_id variant=variant config=config /> }
    })
    .forget();

    Ok(())
}
