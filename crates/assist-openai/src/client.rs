use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::chat::{self, ChatCompletion, ChatCompletionRequest};
use crate::common::{DeletionStatus, List};
use crate::config::OpenAIConfig;
use crate::error::Error;
use crate::files::{self, File};
use crate::request::ApiRequest;
use crate::runs::{self, Run, RunRequest, SubmitToolOutputsRequest};
use crate::threads::{self, Thread, ThreadRequest};
use crate::transport::{ReqwestTransport, Transport};

/// Executes endpoint requests through a [`Transport`].
///
/// Cheap to clone; clones share the configuration and the transport.
#[derive(Clone)]
pub struct Client {
    state: Arc<ClientState>,
}

struct ClientState {
    config: OpenAIConfig,
    transport: Box<dyn Transport>,
}

impl Client {
    /// Client using the default `reqwest` transport.
    pub fn new(config: OpenAIConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    /// Client configured from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        Self::new(OpenAIConfig::from_env())
    }

    pub fn with_transport(config: OpenAIConfig, transport: impl Transport + 'static) -> Self {
        Self {
            state: Arc::new(ClientState {
                config,
                transport: Box::new(transport),
            }),
        }
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.state.config
    }

    /// Execute a prepared request and decode the response as `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        let method = request.method.clone();
        let path = request.path.clone();
        let response = self.state.transport.execute(request).await?;
        debug!(%method, %path, status = response.status, "openai request");
        response.decode()
    }

    pub async fn chat_completion(&self, body: &ChatCompletionRequest) -> Result<ChatCompletion, Error> {
        self.send(chat::completion(self.config(), body)?).await
    }

    pub async fn create_thread(&self, body: Option<&ThreadRequest>) -> Result<Thread, Error> {
        self.send(threads::create(self.config(), body)?).await
    }

    pub async fn retrieve_thread(&self, thread_id: &str) -> Result<Thread, Error> {
        self.send(threads::retrieve(self.config(), thread_id)).await
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus, Error> {
        self.send(threads::delete(self.config(), thread_id)).await
    }

    pub async fn create_run(&self, thread_id: &str, body: &RunRequest) -> Result<Run, Error> {
        self.send(runs::create(self.config(), thread_id, body)?).await
    }

    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, Error> {
        self.send(runs::retrieve(self.config(), thread_id, run_id)).await
    }

    /// Ask the service to cancel a run. The returned snapshot is usually
    /// `cancelling`.
    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, Error> {
        self.send(runs::cancel(self.config(), thread_id, run_id)).await
    }

    /// Submit outputs as given. Use [`RunDriver::submit`](crate::RunDriver::submit)
    /// to check them against the pending calls first.
    pub async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        body: &SubmitToolOutputsRequest,
    ) -> Result<Run, Error> {
        self.send(runs::submit_tool_outputs(self.config(), thread_id, run_id, body)?)
            .await
    }

    pub async fn list_files(&self) -> Result<List<File>, Error> {
        self.send(files::list(self.config())).await
    }

    pub async fn retrieve_file(&self, file_id: &str) -> Result<File, Error> {
        self.send(files::retrieve(self.config(), file_id)).await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<DeletionStatus, Error> {
        self.send(files::delete(self.config(), file_id)).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.state.config)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedTransport, respond};
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn client_sends_built_requests_through_transport() {
        let transport = ScriptedTransport::new([
            respond(200, json!({"id": "thread_9", "object": "thread", "created_at": 1})),
            respond(200, json!({"id": "thread_9", "object": "thread.deleted", "deleted": true})),
        ]);
        let client = Client::with_transport(OpenAIConfig::new("sk-test"), transport.clone());

        let thread = client.create_thread(None).await.expect("create");
        let deleted = client.delete_thread(&thread.id).await.expect("delete");

        assert!(deleted.deleted);
        assert_eq!(
            transport.calls(),
            [
                ("POST".to_string(), "/v1/threads".to_string()),
                ("DELETE".to_string(), "/v1/threads/thread_9".to_string()),
            ]
        );
        assert_eq!(
            transport.requests()[0].header("Authorization"),
            Some("Bearer sk-test")
        );
    }

    #[tokio::test]
    async fn api_errors_surface_from_client_calls() {
        let transport = ScriptedTransport::new([respond(
            404,
            json!({"error": {"code": null, "message": "No file with ID", "type": "invalid_request_error", "param": "id"}}),
        )]);
        let client = Client::with_transport(OpenAIConfig::new("k"), transport);

        match client.retrieve_file("file-missing").await {
            Err(Error::Api(error)) => {
                assert_eq!(error.code, None);
                assert_eq!(error.param.as_deref(), Some("id"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_is_shareable_across_tasks() {
        let transport = ScriptedTransport::new([respond(
            200,
            json!({"object": "list", "data": [], "has_more": false}),
        )]);
        let client = Client::with_transport(OpenAIConfig::new("k"), transport);

        let handle = tokio::spawn({
            let client = client.clone();
            async move { client.list_files().await }
        });
        let files = handle.await.expect("join").expect("list");
        assert!(files.data.is_empty());
    }
}
