//! ureq-backed `Transport`.
//!
//! ureq is blocking, so each request runs on tokio's blocking pool and the
//! controller awaits the join handle. The request timeout lives on the agent;
//! the core enforces none.

use std::time::Duration;

use cep_core::{HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Status codes are returned as data, not errors, so the core can read
    /// the server's message out of 4xx/5xx bodies.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(|e| TransportError::new(format!("lookup task failed: {e}")))?
    }
}

fn execute_blocking(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let mut builder = agent.get(&request.url);
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let mut response = builder.call().map_err(|e| {
        tracing::debug!(url = %request.url, error = %e, "request failed");
        TransportError::new(e.to_string())
    })?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| TransportError::new(e.to_string()))?;

    tracing::debug!(url = %request.url, status, "response received");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
