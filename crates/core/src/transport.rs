use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use thiserror::Error;
use url::Url;

use crate::error::RpcClientError;
use crate::jsonrpc::USER_AGENT;

/// Keep-alive connections retained per host by the default HTTP transport.
const MAX_KEEPALIVE_CONNECTIONS: usize = 10;

/// A transport-level fault: connection refused, timeout, DNS failure, or any
/// other I/O error. Retryable, unlike protocol or decode errors.
#[derive(Debug, Error)]
#[error("transport fault: {0}")]
pub struct TransportError(pub String);

/// One fully assembled POST, ready to send (and re-send on retry).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: Url,
    pub host: String,
    pub auth_header: String,
    pub body: String,
}

/// Seam between the retry machine and the HTTP stack. Implementations return
/// the raw response body; status handling and decoding stay with the caller.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, request: &TransportRequest) -> Result<String, TransportError>;
}

/// Default transport backed by a pooled reqwest client. Built once per root
/// handle and shared by every handle derived from it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, RpcClientError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(MAX_KEEPALIVE_CONNECTIONS)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, request: &TransportRequest) -> Result<String, TransportError> {
        let response = self
            .client
            .post(request.url.clone())
            .header(header::HOST, &request.host)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::AUTHORIZATION, &request.auth_header)
            .header(header::CONTENT_TYPE, "application/json")
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        // The node reports failures inside the JSON envelope, so a non-2xx
        // status still carries a decodable body.
        response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))
    }
}
