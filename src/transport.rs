//! Outbound transport identity.
//!
//! Every call that touches YouTube goes out under an explicit [`Transport`]
//! value (user agent plus optional forward proxy) instead of process-wide
//! mutable state, so concurrent jobs cannot interfere with each other's
//! proxy or identity settings.

use crate::error::{Result, YouLearnError};
use rand::seq::SliceRandom;
use std::time::Duration;
use url::Url;

/// Browser identities rotated across requests to avoid automated-access
/// detection.
pub const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
];

/// Pick a random identity from the pool.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// One outbound identity: user agent plus optional forward-proxy URL.
#[derive(Debug, Clone)]
pub struct Transport {
    pub user_agent: &'static str,
    pub proxy_url: Option<String>,
}

impl Transport {
    /// Direct connection with a random identity.
    pub fn direct() -> Self {
        Self {
            user_agent: random_user_agent(),
            proxy_url: None,
        }
    }

    /// Random identity routed through `proxy_url` when one is configured.
    pub fn with_proxy(proxy_url: Option<String>) -> Self {
        Self {
            user_agent: random_user_agent(),
            proxy_url,
        }
    }

    /// Build an HTTP client carrying this identity.
    pub fn http_client(&self, timeout: Duration) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .timeout(timeout);

        if let Some(url) = &self.proxy_url {
            // Validate before handing to reqwest so a config typo surfaces
            // as a configuration error, not a request failure.
            Url::parse(url)
                .map_err(|e| YouLearnError::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(reqwest::Proxy::all(url)?);
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_pool_membership() {
        let ua = random_user_agent();
        assert!(USER_AGENTS.contains(&ua));
    }

    #[test]
    fn test_direct_client_builds() {
        let transport = Transport::direct();
        assert!(transport.http_client(Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn test_invalid_proxy_url_is_config_error() {
        let transport = Transport {
            user_agent: USER_AGENTS[0],
            proxy_url: Some("not a url".into()),
        };
        match transport.http_client(Duration::from_secs(10)) {
            Err(YouLearnError::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }
}
