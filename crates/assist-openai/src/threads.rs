//! Threads: remote conversation histories that runs operate over.
//!
//! - Documents: <https://platform.openai.com/docs/api-reference/threads>

use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::{Family, OpenAIConfig};
use crate::content::{Content, ContentPart};
use crate::error::Error;
use crate::request::ApiRequest;

/// `POST /v1/threads`. Response: [`Thread`].
pub fn create(config: &OpenAIConfig, body: Option<&ThreadRequest>) -> Result<ApiRequest, Error> {
    let request = ApiRequest::new(config, Family::Assistants, Method::POST, "/v1/threads");
    match body {
        Some(body) => request.json(body),
        None => Ok(request),
    }
}

/// `GET /v1/threads/{thread_id}`. Response: [`Thread`].
pub fn retrieve(config: &OpenAIConfig, thread_id: &str) -> ApiRequest {
    ApiRequest::new(
        config,
        Family::Assistants,
        Method::GET,
        format!("/v1/threads/{thread_id}"),
    )
}

/// `DELETE /v1/threads/{thread_id}`. Response: [`DeletionStatus`](crate::DeletionStatus).
pub fn delete(config: &OpenAIConfig, thread_id: &str) -> ApiRequest {
    ApiRequest::new(
        config,
        Family::Assistants,
        Method::DELETE,
        format!("/v1/threads/{thread_id}"),
    )
}

/// - Documents: <https://platform.openai.com/docs/api-reference/threads/object>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_interpreter: Option<CodeInterpreterResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeInterpreterResources {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSearchResources {
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl ThreadRequest {
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }
}

/// A message seeded into a thread or appended to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Message {
    pub fn user(content: impl Into<Content>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn user_parts(parts: impl IntoIterator<Item = ContentPart>) -> Self {
        Self::user(Content::Parts(parts.into_iter().collect()))
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
