//! The HTTP boundary. Everything above it works on [`ApiRequest`] values and
//! [`HttpResponse`] bytes, so tests can script the service in memory.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{Error, ErrorResponse};
use crate::request::ApiRequest;

/// Raw response: status code and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a 2xx body as `T`. Failed responses become [`Error::Api`] when
    /// the body carries an error envelope and [`Error::Status`] otherwise.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if self.is_success() {
            return Ok(assist_codec::decode(&self.body)?);
        }

        match assist_codec::decode::<ErrorResponse>(&self.body) {
            Ok(ErrorResponse { error }) => {
                warn!(status = self.status, code = ?error.code, "api error: {}", error.message);
                Err(Error::Api(error))
            }
            Err(_) => {
                let body = String::from_utf8_lossy(&self.body).into_owned();
                warn!(status = self.status, "request failed without an error body");
                Err(Error::Status {
                    status: self.status,
                    body,
                })
            }
        }
    }
}

/// Executes one request. Implementations perform no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<HttpResponse, Error>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<HttpResponse, Error> {
        let url = request.url();
        let mut req = self.client.request(request.method, &url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }

        let resp = req.send().await.map_err(|e| Error::Http(Box::new(e)))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| Error::Http(Box::new(e)))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
