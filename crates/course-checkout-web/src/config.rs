//! Build-Time Configuration

use course_checkout_core::{Result, WidgetConfig};

/// Configuration from variables set when the WASM bundle was built
pub fn build_config() -> Result<WidgetConfig> {
    WidgetConfig::from_vars(|key| {
        let value = match key {
            "COURSE_APP_URL" => option_env!("COURSE_APP_URL"),
            "API_BASE_URL" => option_env!("API_BASE_URL"),
            "AUTH_COOKIE" => option_env!("AUTH_COOKIE"),
            _ => None,
        };
        value.map(str::to_string)
    })
}
