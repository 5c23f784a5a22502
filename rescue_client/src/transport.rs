//! HTTP transport to the simulation server.

use std::time::Duration;

use async_trait::async_trait;
use rescue_shared::{
    error::{FetchError, TransportError},
    net::{
        send_request, HttpResponse, Method, ServerUrl, Transport, START_PATH, STATE_PATH,
        STEP_PATH,
    },
    snapshot::GameSnapshot,
};
use tracing::debug;

/// One short-lived connection per request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: ServerUrl,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: ServerUrl, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    /// Parses `server_url` and builds a transport for it.
    pub fn from_url(server_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self::new(ServerUrl::parse(server_url)?, timeout))
    }

    pub fn url(&self) -> &ServerUrl {
        &self.url
    }

    async fn call(&self, method: Method, route: &str) -> Result<HttpResponse, TransportError> {
        let response = send_request(&self.url, method, route, self.timeout).await?;
        debug!(
            method = method.as_str(),
            route,
            status = response.status,
            bytes = response.body.len(),
            "HTTP exchange"
        );
        response.error_for_status()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start_session(&mut self) -> Result<String, TransportError> {
        Ok(self.call(Method::Post, START_PATH).await?.body_text())
    }

    async fn fetch_snapshot(&mut self) -> Result<GameSnapshot, FetchError> {
        let response = self.call(Method::Get, STATE_PATH).await?;
        Ok(GameSnapshot::from_json_slice(&response.body)?)
    }

    async fn advance_step(&mut self) -> Result<String, TransportError> {
        Ok(self.call(Method::Post, STEP_PATH).await?.body_text())
    }
}
