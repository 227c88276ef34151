use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::ports::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// `HttpTransport` backed by a reqwest client with a fixed request timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Default per-request timeout (15 seconds)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut req = self.http.request(method, &request.url);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = ReqwestTransport::new(ReqwestTransport::DEFAULT_TIMEOUT);
        assert!(transport.is_ok());
    }
}
