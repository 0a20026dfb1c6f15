//! Forwarding to the automation's HTTP webhooks.
//!
//! [`WebhookForwarder`] POSTs a JSON body to one of two configured
//! endpoints: the number-submission hook and the number-deletion hook.
//! Each call is a single attempt bounded by the client timeout.

use std::time::Duration;

use serde_json::Value;

/// Default timeout for one forwarding attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    /// No base URL is configured.
    #[error("Webhook forwarding is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookTarget {
    /// New numbers to block.
    Submit,
    /// A number to unblock.
    Delete,
}

impl WebhookTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookTarget::Submit => "submit",
            WebhookTarget::Delete => "delete",
        }
    }
}

/// What the upstream answered.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardedResponse {
    pub status: u16,
    /// Parsed JSON body, or the raw text wrapped as a JSON string.
    pub body: Value,
}

impl ForwardedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// WebhookForwarder
// ---------------------------------------------------------------------------

pub struct WebhookForwarder {
    client: reqwest::Client,
    base_url: Option<String>,
    submit_path: String,
    delete_path: String,
}

impl WebhookForwarder {
    /// `base_url` of `None` disables forwarding.
    pub fn new(
        base_url: Option<String>,
        submit_path: impl Into<String>,
        delete_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            submit_path: submit_path.into(),
            delete_path: delete_path.into(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Full URL for a target.
    pub fn url_for(&self, target: WebhookTarget) -> Result<String, WebhookError> {
        let base = self.base_url.as_deref().ok_or(WebhookError::NotConfigured)?;
        let path = match target {
            WebhookTarget::Submit => &self.submit_path,
            WebhookTarget::Delete => &self.delete_path,
        };
        if path.starts_with('/') {
            Ok(format!("{base}{path}"))
        } else {
            Ok(format!("{base}/{path}"))
        }
    }

    /// POST `payload` and hand back whatever the upstream answered,
    /// including non-2xx statuses.
    pub async fn forward(
        &self,
        target: WebhookTarget,
        payload: &Value,
    ) -> Result<ForwardedResponse, WebhookError> {
        let url = self.url_for(target)?;
        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        tracing::info!(hook = target.as_str(), url = %url, status, "Webhook forwarded");
        Ok(ForwardedResponse { status, body })
    }

    /// Fire-and-check variant: non-2xx is an error.
    pub async fn notify(&self, target: WebhookTarget, payload: &Value) -> Result<(), WebhookError> {
        let response = self.forward(target, payload).await?;
        if !response.is_success() {
            return Err(WebhookError::HttpStatus(response.status));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
