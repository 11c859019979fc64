// src/services/oracle.rs

//! Forecast oracle client.
//!
//! The oracle is an external reasoning service spoken to over a
//! chat-completions style API. It is untrusted: callers receive the raw JSON
//! object it produced and are responsible for validating every field. The
//! trait exists so the prediction pipeline can be tested with a fake.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Config, OracleConfig};

/// External reasoning oracle.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send one system/user exchange and return the JSON object replied.
    async fn complete_json(&self, system: &str, user: &str) -> Result<serde_json::Value>;
}

/// HTTP-backed oracle client.
pub struct HttpOracle {
    config: OracleConfig,
    client: reqwest::Client,
}

impl HttpOracle {
    /// Build a client from configuration.
    ///
    /// Fails if the oracle is not configured; callers decide whether a
    /// missing oracle degrades to limited mode or is an error.
    pub fn new(config: &Config) -> Result<Self> {
        if !config.oracle.is_configured() {
            return Err(AppError::config("oracle endpoint/key not configured"));
        }

        let client = reqwest::Client::builder()
            .user_agent(&config.fetch.user_agent)
            .timeout(Duration::from_secs(config.oracle.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            config: config.oracle.clone(),
            client,
        })
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn complete_json(&self, system: &str, user: &str) -> Result<serde_json::Value> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
            // Lower temperature for more consistent predictions
            "temperature": 0.3,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::prediction(format!("oracle request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::prediction(format!("oracle returned HTTP {status}")));
        }

        let reply: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::prediction(format!("oracle reply unreadable: {e}")))?;

        let content = reply
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| AppError::prediction("oracle reply carried no content"))?;

        let parsed: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| AppError::prediction(format!("oracle content is not JSON: {e}")))?;

        if !parsed.is_object() {
            return Err(AppError::prediction("oracle content is not a JSON object"));
        }

        Ok(parsed)
    }
}
