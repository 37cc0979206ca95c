//! Uploaded files. Uploading itself needs a multipart body and is not covered.
//!
//! - Documents: <https://platform.openai.com/docs/api-reference/files>

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::{Family, OpenAIConfig};
use crate::request::ApiRequest;

/// `GET /v1/files`. Response: [`List<File>`](crate::List).
pub fn list(config: &OpenAIConfig) -> ApiRequest {
    ApiRequest::new(config, Family::Base, Method::GET, "/v1/files")
}

/// `GET /v1/files/{file_id}`. Response: [`File`].
pub fn retrieve(config: &OpenAIConfig, file_id: &str) -> ApiRequest {
    ApiRequest::new(
        config,
        Family::Base,
        Method::GET,
        format!("/v1/files/{file_id}"),
    )
}

/// `DELETE /v1/files/{file_id}`. Response: [`DeletionStatus`](crate::DeletionStatus).
pub fn delete(config: &OpenAIConfig, file_id: &str) -> ApiRequest {
    ApiRequest::new(
        config,
        Family::Base,
        Method::DELETE,
        format!("/v1/files/{file_id}"),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    pub object: String,
    pub bytes: u64,
    pub created_at: i64,
    pub filename: String,
    /// e.g. `assistants`, `vision`, `fine-tune`.
    pub purpose: String,
}
