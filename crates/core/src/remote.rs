//! HTTP client for the subscription backend
//!
//! The backend owns the authoritative subscription state. This module only
//! maps its three endpoints onto `StatusClient`; the ledger decides what a
//! failure means.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AccessError;
use crate::window::SubscriptionWindow;

pub const DEFAULT_API_URL: &str = "https://api.mealgate.app/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Subscription as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSubscription {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub plan_name: String,
}

impl RemoteSubscription {
    /// Parses the backend's date strings into a window.
    pub fn to_window(&self) -> Result<SubscriptionWindow, AccessError> {
        Ok(SubscriptionWindow {
            start: parse_timestamp(&self.start_date)?,
            end: parse_timestamp(&self.end_date)?,
            plan_id: self.plan_id.clone(),
            plan_label: self.plan_name.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusData {
    #[serde(default)]
    pub has_active_subscription: bool,
    #[serde(default)]
    pub subscription: Option<RemoteSubscription>,
    #[serde(default)]
    pub can_access_app: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<StatusData>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateRequest<'a> {
    pub user_id: &'a str,
    pub duration_days: u32,
    pub payment_metadata: &'a PaymentMetadata,
}

#[derive(Debug, Deserialize)]
pub struct ActivateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    pub reference: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub subscription: Option<RemoteSubscription>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Free-form context attached to an activation (payment reference, plan).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// The backend's subscription endpoints.
pub trait StatusClient: Send + Sync {
    /// `GET subscription/status?user_id=<id>`
    fn subscription_status(&self, user_id: &str) -> Result<StatusData, AccessError>;

    /// `POST subscription/activate-days`
    fn activate_days(
        &self,
        user_id: &str,
        duration_days: u32,
        metadata: &PaymentMetadata,
    ) -> Result<(), AccessError>;

    /// `POST subscription/verify-payment`
    fn verify_payment(&self, reference: &str) -> Result<Option<RemoteSubscription>, AccessError>;
}

/// Blocking reqwest implementation of `StatusClient`.
pub struct HttpStatusClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpStatusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccessError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AccessError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl StatusClient for HttpStatusClient {
    fn subscription_status(&self, user_id: &str) -> Result<StatusData, AccessError> {
        let resp = self
            .client
            .get(self.endpoint("subscription/status"))
            .query(&[("user_id", user_id)])
            .send()
            .map_err(|e| AccessError::Transport(e.to_string()))?;

        let body: StatusResponse = read_json(resp)?;
        if !body.success {
            return Err(AccessError::Rejected(
                body.message.unwrap_or_else(|| "status lookup failed".to_string()),
            ));
        }
        body.data
            .ok_or_else(|| AccessError::Parse("status response has no data".to_string()))
    }

    fn activate_days(
        &self,
        user_id: &str,
        duration_days: u32,
        metadata: &PaymentMetadata,
    ) -> Result<(), AccessError> {
        let body = ActivateRequest {
            user_id,
            duration_days,
            payment_metadata: metadata,
        };
        let resp = self
            .client
            .post(self.endpoint("subscription/activate-days"))
            .json(&body)
            .send()
            .map_err(|e| AccessError::Transport(e.to_string()))?;

        let data: ActivateResponse = read_json(resp)?;
        if data.success {
            Ok(())
        } else {
            Err(AccessError::Rejected(
                data.message.unwrap_or_else(|| "activation refused".to_string()),
            ))
        }
    }

    fn verify_payment(&self, reference: &str) -> Result<Option<RemoteSubscription>, AccessError> {
        let resp = self
            .client
            .post(self.endpoint("subscription/verify-payment"))
            .json(&VerifyRequest { reference })
            .send()
            .map_err(|e| AccessError::Transport(e.to_string()))?;

        let data: VerifyResponse = read_json(resp)?;
        if data.success {
            Ok(data.subscription)
        } else {
            Err(AccessError::Rejected(
                data.message.unwrap_or_else(|| "payment not verified".to_string()),
            ))
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::blocking::Response,
) -> Result<T, AccessError> {
    if !resp.status().is_success() {
        return Err(AccessError::Transport(format!("HTTP {}", resp.status())));
    }
    let text = resp
        .text()
        .map_err(|e| AccessError::Transport(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| AccessError::Parse(e.to_string()))
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC), or a bare date.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AccessError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(AccessError::Parse(format!("unrecognized timestamp '{value}'")))
}
