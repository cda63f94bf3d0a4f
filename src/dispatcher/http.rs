//! HTTP seam used by the dispatcher.
//!
//! The dispatcher never talks to reqwest directly: it goes through [`HttpTransport`], so tests
//! can script success and failure sequences and other HTTP stacks can be plugged in.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Network-level failure raised by a transport (DNS, TLS, connect, timeout).
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    ClientError,
    ServerError,
}

impl HttpResponse {
    pub fn class(&self) -> ResponseClass {
        ResponseClass::from_status(self.status)
    }
}

impl ResponseClass {
    /// Anything outside 2xx and 5xx counts as a client error.
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            500..=599 => Self::ServerError,
            _ => Self::ClientError,
        }
    }
}

pub trait HttpTransport: Send + Sync {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        headers: &'a [(String, String)],
        body: &'a serde_json::Value,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>>;

    fn get<'a>(
        &'a self,
        url: &'a str,
        headers: &'a [(String, String)],
        timeout: Duration,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(request: reqwest::RequestBuilder) -> Result<HttpResponse, BoxError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        headers: &'a [(String, String)],
        body: &'a serde_json::Value,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
        Box::pin(async move {
            let mut request = self.client.post(url).timeout(timeout);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
            Self::execute(request.json(body)).await
        })
    }

    fn get<'a>(
        &'a self,
        url: &'a str,
        headers: &'a [(String, String)],
        timeout: Duration,
    ) -> BoxFuture<'a, Result<HttpResponse, BoxError>> {
        Box::pin(async move {
            let mut request = self.client.get(url).timeout(timeout);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
            Self::execute(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn statuses_are_classified_by_range() {
        assert_eq!(response(200).class(), ResponseClass::Success);
        assert_eq!(response(201).class(), ResponseClass::Success);
        assert_eq!(response(400).class(), ResponseClass::ClientError);
        assert_eq!(response(401).class(), ResponseClass::ClientError);
        assert_eq!(response(302).class(), ResponseClass::ClientError);
        assert_eq!(response(500).class(), ResponseClass::ServerError);
        assert_eq!(response(503).class(), ResponseClass::ServerError);
    }
}
