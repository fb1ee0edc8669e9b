//! HTTP IP lookup services.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use quill_core::ports::{IdentityError, IpLookup};

/// Public services returning `{"ip": "..."}`, consulted in this order.
pub const DEFAULT_LOOKUP_SERVICES: &[&str] = &[
    "https://api.ipify.org?format=json",
    "https://api64.ipify.org?format=json",
    "https://ipapi.co/json/",
];

#[derive(Debug, Deserialize)]
struct LookupResponse {
    ip: Option<String>,
}

/// A single JSON IP lookup endpoint.
pub struct HttpIpLookup {
    client: reqwest::Client,
    url: String,
}

impl HttpIpLookup {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// One lookup per default service sharing a client with the given request timeout.
    pub fn defaults(timeout: Duration) -> Vec<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        DEFAULT_LOOKUP_SERVICES
            .iter()
            .map(|url| Self::new(client.clone(), *url))
            .collect()
    }
}

#[async_trait]
impl IpLookup for HttpIpLookup {
    fn name(&self) -> &str {
        &self.url
    }

    async fn lookup(&self) -> Result<String, IdentityError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Timeout
                } else {
                    IdentityError::Lookup(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| IdentityError::Lookup(e.to_string()))?;

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Lookup(e.to_string()))?;

        body.ip
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .ok_or(IdentityError::NoIp)
    }
}
