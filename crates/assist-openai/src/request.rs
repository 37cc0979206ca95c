//! The value handed to a [`Transport`](crate::Transport): method, URL parts,
//! headers and an optional JSON body. Building one performs no I/O.

use reqwest::Method;
use serde::Serialize;

use crate::config::{Family, OpenAIConfig};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub base_url: String,
    /// Path including the `/v1` prefix.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub(crate) fn new(
        config: &OpenAIConfig,
        family: Family,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        Self {
            method,
            base_url: config.base_url.clone(),
            path: path.into(),
            headers: config.headers(family),
            body: None,
        }
    }

    /// Attach a JSON body.
    pub(crate) fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(assist_codec::encode(body)?);
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        Ok(self)
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_host_and_path() {
        let config = OpenAIConfig {
            base_url: "https://example.test/".into(),
            ..OpenAIConfig::new("k")
        };
        let request = ApiRequest::new(&config, Family::Base, Method::GET, "/v1/files");
        assert_eq!(request.url(), "https://example.test/v1/files");
        assert_eq!(request.header("authorization"), Some("Bearer k"));
        assert_eq!(request.body, None);
    }

    #[test]
    fn json_body_sets_content_type() {
        let config = OpenAIConfig::new("k");
        let request = ApiRequest::new(&config, Family::Base, Method::POST, "/v1/x")
            .json(&serde_json::json!({"a": 1}))
            .expect("encode");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some(&br#"{"a":1}"#[..]));
    }
}
