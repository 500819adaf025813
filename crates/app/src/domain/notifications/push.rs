//! Push channel.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::appointments::records::AccountUuid;

/// Push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: String,
    pub tag: String,
}

/// Device delivery counts reported by the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PushReport {
    pub sent: u32,
    pub failed: u32,
}

impl PushReport {
    /// Zero devices reached counts as a channel failure.
    pub fn delivered(self) -> bool {
        self.sent > 0
    }
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push gateway request failed")]
    Http(#[from] reqwest::Error),

    #[error("unexpected push gateway response: {0}")]
    UnexpectedResponse(String),
}

#[automock]
#[async_trait]
/// Sends a push notification to every device of an account.
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        account: AccountUuid,
        message: &PushMessage,
    ) -> Result<PushReport, PushError>;
}

/// Push gateway connection settings.
#[derive(Debug, Clone)]
pub struct PushGatewayConfig {
    /// Base URL, e.g. `"https://push.internal"`.
    pub url: String,

    /// Bearer token, if the gateway requires one.
    pub token: Option<String>,

    pub timeout: Duration,
}

/// Push sender backed by an HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpPushSender {
    config: PushGatewayConfig,
    http: Client,
}

impl HttpPushSender {
    pub fn new(config: PushGatewayConfig) -> Result<Self, PushError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    fn endpoint(&self, account: AccountUuid) -> String {
        format!(
            "{}/accounts/{account}/push",
            self.config.url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    #[tracing::instrument(
        name = "push.send",
        skip(self, message),
        fields(account_id = %account, tag = %message.tag),
        err
    )]
    async fn send(
        &self,
        account: AccountUuid,
        message: &PushMessage,
    ) -> Result<PushReport, PushError> {
        let mut request = self.http.post(self.endpoint(account)).json(message);

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(PushError::UnexpectedResponse(format!(
                "push request failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

/// Used when no gateway is configured; every send reaches zero devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPushSender;

#[async_trait]
impl PushSender for DisabledPushSender {
    async fn send(
        &self,
        _account: AccountUuid,
        _message: &PushMessage,
    ) -> Result<PushReport, PushError> {
        Ok(PushReport::default())
    }
}
