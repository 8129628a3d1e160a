//! Best-effort destination resolution with a DNS-over-HTTPS fallback.
//!
//! Literal IPs pass through untouched. Domains get one A-record lookup
//! against a public DoH resolver with a bounded timeout; any failure falls
//! back to the original hostname, leaving resolution to the OS stack at
//! connect time. Resolution never fails the caller.

use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

const DOH_ENDPOINT: &str = "https://dns.google/resolve";
const DOH_TIMEOUT: Duration = Duration::from_secs(5);

/// DNS record type for an IPv4 address answer.
const TYPE_A: u32 = 1;

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer")]
    answer: Option<Vec<DohAnswer>>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u32,
    data: String,
}

/// Shared resolver holding one HTTP client for all sessions.
#[derive(Debug, Clone)]
pub struct Resolver {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_endpoint(DOH_ENDPOINT)
    }

    /// Resolver against a specific DoH endpoint; tests point this at local
    /// listeners to exercise the fallback paths.
    fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Resolve `host` to a connectable address text.
    ///
    /// Invariant: a syntactically valid literal IP is returned byte-identical
    /// to the input, with no network call.
    pub async fn resolve(&self, host: &str) -> String {
        if host.parse::<IpAddr>().is_ok() {
            return host.to_string();
        }

        match self.lookup_a(host).await {
            Some(ip) => {
                debug!(host, ip = %ip, "resolved via DoH");
                ip
            }
            None => {
                debug!(host, "DoH resolution unavailable, falling back to hostname");
                host.to_string()
            }
        }
    }

    /// One A-record query; `None` on any failure.
    async fn lookup_a(&self, host: &str) -> Option<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", host), ("type", "A")])
            .header("Accept", "application/dns-json")
            .timeout(DOH_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(host, error = %e, "DoH request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(host, status = %response.status(), "DoH resolver returned non-success");
            return None;
        }

        let body: DohResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(host, error = %e, "malformed DoH response");
                return None;
            }
        };

        body.answer?
            .into_iter()
            .find(|a| a.record_type == TYPE_A)
            .map(|a| a.data)
    }
}
