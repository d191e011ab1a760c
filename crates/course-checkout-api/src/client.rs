//! Billing API Client

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use course_checkout_core::{
    CheckoutError, CheckoutSessionRequest, CheckoutSessionResponse, CheckoutSessions, CourseId, CoursePricing,
    EnrollmentQuery, EnrollmentStatus, PricingQuery, Result, WidgetConfig,
};

pub const PRICING_PATH: &str = "/v1-course-pricing";
pub const ENROLLMENT_PATH: &str = "/v1-course-progress";
pub const CHECKOUT_SESSION_PATH: &str = "/v1-create-checkout-session";

/// Client for the billing and progress APIs
#[derive(Clone, Debug)]
pub struct BillingClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BillingClient {
    /// Create a client; an empty `base_url` means same origin
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &WidgetConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    /// Send `Authorization: Bearer <token>` with every request
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Full URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.endpoint(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| CheckoutError::Decode(e.to_string()))
    }
}

/// Error bodies come as `{"message": ...}`, older endpoints use `{"error": ...}`
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Build an API error from a non-success response body
pub fn api_error(status: u16, body: &str) -> CheckoutError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message.or(parsed.error))
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty());

    CheckoutError::Api { status, message }
}

#[async_trait(?Send)]
impl PricingQuery for BillingClient {
    async fn pricing(&self, course: &CourseId) -> Result<CoursePricing> {
        tracing::debug!(course_id = %course, "Fetching course pricing");
        self.send_json(self.request(Method::GET, &format!("{PRICING_PATH}/{course}")))
            .await
    }
}

#[async_trait(?Send)]
impl EnrollmentQuery for BillingClient {
    async fn enrollment(&self, course: &CourseId) -> Result<EnrollmentStatus> {
        if self.token.is_none() {
            return Err(CheckoutError::Unauthenticated);
        }

        tracing::debug!(course_id = %course, "Fetching enrollment");
        self.send_json(self.request(Method::GET, &format!("{ENROLLMENT_PATH}/{course}")))
            .await
    }
}

#[async_trait(?Send)]
impl CheckoutSessions for BillingClient {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSessionResponse> {
        tracing::info!(course_id = %request.course_id, "Creating checkout session");
        let session: CheckoutSessionResponse = self
            .send_json(self.request(Method::POST, CHECKOUT_SESSION_PATH).json(request))
            .await?;

        if session.checkout_url.is_empty() {
            return Err(CheckoutError::Decode("No checkout URL returned".into()));
        }
        Ok(session)
    }
}
