//! Runs: executions of an assistant against a thread.
//!
//! - Documents: <https://platform.openai.com/docs/api-reference/runs>

use std::collections::{BTreeMap, HashSet};

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::common::Usage;
use crate::config::{Family, OpenAIConfig};
use crate::error::Error;
use crate::request::ApiRequest;
use crate::threads::Message;
use crate::tools::{ResponseFormat, Tool, ToolCall, ToolChoice};

/// `POST /v1/threads/{thread_id}/runs`. Response: [`Run`].
pub fn create(config: &OpenAIConfig, thread_id: &str, body: &RunRequest) -> Result<ApiRequest, Error> {
    ApiRequest::new(
        config,
        Family::Assistants,
        Method::POST,
        format!("/v1/threads/{thread_id}/runs"),
    )
    .json(body)
}

/// `GET /v1/threads/{thread_id}/runs/{run_id}`. Response: [`Run`].
pub fn retrieve(config: &OpenAIConfig, thread_id: &str, run_id: &str) -> ApiRequest {
    ApiRequest::new(
        config,
        Family::Assistants,
        Method::GET,
        format!("/v1/threads/{thread_id}/runs/{run_id}"),
    )
}

/// `POST /v1/threads/{thread_id}/runs/{run_id}/cancel`. Response: [`Run`].
pub fn cancel(config: &OpenAIConfig, thread_id: &str, run_id: &str) -> ApiRequest {
    ApiRequest::new(
        config,
        Family::Assistants,
        Method::POST,
        format!("/v1/threads/{thread_id}/runs/{run_id}/cancel"),
    )
}

/// `POST /v1/threads/{thread_id}/runs/{run_id}/submit_tool_outputs`.
/// Response: [`Run`].
pub fn submit_tool_outputs(
    config: &OpenAIConfig,
    thread_id: &str,
    run_id: &str,
    body: &SubmitToolOutputsRequest,
) -> Result<ApiRequest, Error> {
    ApiRequest::new(
        config,
        Family::Assistants,
        Method::POST,
        format!("/v1/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
    )
    .json(body)
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// The run will not change state again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
        )
    }

    /// The run is still being worked on remotely and should be re-fetched.
    /// `cancelling` always moves on to `cancelled`, so it counts as pending.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }
}

/// Snapshot of a run. Local values are never updated in place; re-fetch to
/// observe a newer state.
///
/// - Documents: <https://platform.openai.com/docs/api-reference/runs/object>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<LastError>,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub cancelled_at: Option<i64>,
    #[serde(default)]
    pub failed_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub max_prompt_tokens: Option<u32>,
    #[serde(default)]
    pub max_completion_tokens: Option<u32>,
    #[serde(default)]
    pub truncation_strategy: Option<TruncationStrategy>,
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
    #[serde(default)]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default)]
    pub parallel_tool_calls: Option<bool>,
}

impl Run {
    /// Tool calls awaiting outputs. Empty unless the run requires action.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match &self.required_action {
            Some(RequiredAction::SubmitToolOutputs { submit_tool_outputs }) => {
                &submit_tool_outputs.tool_calls
            }
            None => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequiredAction {
    SubmitToolOutputs {
        submit_tool_outputs: SubmitToolOutputs,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteDetails {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationStrategy {
    /// `auto` or `last_messages`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_messages: Option<u32>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunRequest {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_instructions: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl RunRequest {
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmitToolOutputsRequest {
    pub tool_outputs: Vec<ToolOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl SubmitToolOutputsRequest {
    pub fn new(tool_outputs: Vec<ToolOutput>) -> Self {
        Self {
            tool_outputs,
            stream: None,
        }
    }
}

/// The caller's answer to one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolOutput {
    pub fn new(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
        }
    }
}

/// Check that the outputs answer each pending call exactly once.
///
/// Missing ids are reported first, in the order the calls were issued, as
/// [`Error::IncompleteToolOutputs`]. Otherwise ids that match no pending call
/// or appear more than once are reported, in output order, as
/// [`Error::UnexpectedToolOutputs`].
pub fn validate_tool_outputs(pending: &[ToolCall], outputs: &[ToolOutput]) -> Result<(), Error> {
    let answered: HashSet<&str> = outputs.iter().map(|o| o.tool_call_id.as_str()).collect();
    let missing: Vec<String> = pending
        .iter()
        .map(ToolCall::id)
        .filter(|id| !answered.contains(id))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(Error::IncompleteToolOutputs { missing });
    }

    let expected: HashSet<&str> = pending.iter().map(ToolCall::id).collect();
    let mut seen = HashSet::new();
    let mut unexpected: Vec<String> = Vec::new();
    for id in outputs.iter().map(|o| o.tool_call_id.as_str()) {
        let fresh = seen.insert(id);
        if (!fresh || !expected.contains(id)) && !unexpected.iter().any(|u| u == id) {
            unexpected.push(id.to_string());
        }
    }

    if unexpected.is_empty() {
        Ok(())
    } else {
        Err(Error::UnexpectedToolOutputs { ids: unexpected })
    }
}
