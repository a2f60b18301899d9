//! Blocking HTTP transport for the core, backed by ureq.

use std::time::Duration;

use todo_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};

/// Sends core requests with ureq. Every HTTP status is handed back as a
/// response; only connection-level failures become `ApiError::Transport`.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
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
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = req.method.as_str(), path = %req.path, "sending request");
        let agent = &self.agent;
        let body = req.body.unwrap_or_default();
        let result = match req.method {
            HttpMethod::Get => agent.get(&req.path).call(),
            HttpMethod::Delete => agent.delete(&req.path).call(),
            HttpMethod::Post => agent
                .post(&req.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            HttpMethod::Put => agent
                .put(&req.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            HttpMethod::Patch => agent.patch(&req.path).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        tracing::debug!(status, "received response");
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}
