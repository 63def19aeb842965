//! HTTP transport for the availability endpoint.
//!
//! Builds one `reqwest::Client` per configured proxy (or a single direct
//! client) and hands them out round-robin with an atomic cursor.

use super::{ProbeResponse, ProbeTransport};
use crate::error::ProbeError;
use crate::types::ProbeConfig;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One client plus the proxy it routes through, if any.
struct Route {
    client: reqwest::Client,
    proxy: Option<String>,
}

/// Availability checks over HTTP, rotating across proxies.
pub struct HttpTransport {
    endpoint: String,
    token: String,
    routes: Vec<Route>,
    cursor: AtomicUsize,
}

impl HttpTransport {
    /// Create a transport from the run configuration.
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let mut routes = Vec::with_capacity(config.proxies.len().max(1));

        if config.proxies.is_empty() {
            routes.push(Route {
                client: build_client(config.request_timeout, None)?,
                proxy: None,
            });
        } else {
            for proxy in &config.proxies {
                let proxy = normalize_proxy_url(proxy);
                routes.push(Route {
                    client: build_client(config.request_timeout, Some(&proxy))?,
                    proxy: Some(proxy),
                });
            }
        }

        Ok(Self {
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            routes,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of distinct routes (1 when running without proxies).
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    fn next_route(&self) -> &Route {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.routes.len();
        &self.routes[index]
    }
}

#[async_trait]
impl ProbeTransport for HttpTransport {
    async fn probe(&self, name: &str) -> Result<ProbeResponse, ProbeError> {
        let route = self.next_route();
        debug!(
            name,
            proxy = route.proxy.as_deref().unwrap_or("direct"),
            "Sending probe"
        );

        let response = route
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .json(&serde_json::json!({ "username": name }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ProbeResponse { status, body })
    }
}

fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<reqwest::Client, ProbeError> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT);

    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
            ProbeError::config(format!("Invalid proxy '{}': {}", proxy, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| {
        ProbeError::network_with_source("Failed to create HTTP client", e.to_string())
    })
}

/// Prefix `http://` onto proxies written as bare `host:port`.
pub fn normalize_proxy_url(proxy: &str) -> String {
    let proxy = proxy.trim();
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{}", proxy)
    }
}
