//! Push Gateway Config

use std::time::Duration;

use clap::Args;

use crate::domain::notifications::push::PushGatewayConfig;

/// Push gateway settings.
#[derive(Debug, Args)]
pub struct PushConfig {
    /// Push gateway base URL; push is disabled when unset
    #[arg(long, env = "PUSH_GATEWAY_URL")]
    pub push_gateway_url: Option<String>,

    /// Push gateway bearer token
    #[arg(long, env = "PUSH_GATEWAY_TOKEN", hide_env_values = true)]
    pub push_gateway_token: Option<String>,

    /// Push request timeout in seconds
    #[arg(long, env = "PUSH_TIMEOUT_SECONDS", default_value_t = 10)]
    pub push_timeout_seconds: u64,
}

impl PushConfig {
    pub fn gateway(&self) -> Option<PushGatewayConfig> {
        let url = self.push_gateway_url.as_ref()?;

        Some(PushGatewayConfig {
            url: url.clone(),
            token: self.push_gateway_token.clone(),
            timeout: Duration::from_secs(self.push_timeout_seconds),
        })
    }
}
