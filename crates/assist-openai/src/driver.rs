//! Drives a run from creation to a terminal state.
//!
//! The loop is: poll while the run is pending, hand required tool calls to a
//! caller-supplied [`ToolCallHandler`], submit its outputs, and repeat until
//! the run settles. Terminal snapshots (including `failed`, `expired` and
//! `incomplete`) are returned as values; only transport and decode failures
//! are errors.
//!
//! The driver never cancels a run on its own. Dropping the future stops
//! polling; wrap a drive in `tokio::time::timeout` to bound it.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::client::Client;
use crate::error::Error;
use crate::runs::{Run, RunRequest, RunStatus, SubmitToolOutputsRequest, ToolOutput, validate_tool_outputs};
use crate::tools::ToolCall;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Produces one [`ToolOutput`] per tool call of a run that requires action.
///
/// Implemented for any `Fn(Vec<ToolCall>) -> impl Future<...>`, so a closure
/// returning an async block works as a handler.
pub trait ToolCallHandler: Send + Sync {
    fn handle(
        &self,
        calls: Vec<ToolCall>,
    ) -> impl Future<Output = Result<Vec<ToolOutput>, Error>> + Send;
}

impl<F, Fut> ToolCallHandler for F
where
    F: Fn(Vec<ToolCall>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<ToolOutput>, Error>> + Send,
{
    fn handle(
        &self,
        calls: Vec<ToolCall>,
    ) -> impl Future<Output = Result<Vec<ToolOutput>, Error>> + Send {
        (self)(calls)
    }
}

#[derive(Debug, Clone)]
pub struct RunDriver {
    client: Client,
    poll_interval: Duration,
}

impl RunDriver {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Create a run on `thread_id`.
    pub async fn start(&self, thread_id: &str, request: &RunRequest) -> Result<Run, Error> {
        let run = self.client.create_run(thread_id, request).await?;
        debug!(run_id = %run.id, status = ?run.status, "run created");
        Ok(run)
    }

    /// Re-fetch `run` once per poll interval until it is no longer pending.
    /// Returns immediately if it already isn't.
    pub async fn poll(&self, mut run: Run) -> Result<Run, Error> {
        while run.status.is_pending() {
            tokio::time::sleep(self.poll_interval).await;
            run = self.client.retrieve_run(&run.thread_id, &run.id).await?;
            debug!(run_id = %run.id, status = ?run.status, "polled run");
        }
        Ok(run)
    }

    /// Submit outputs for the calls `run` is waiting on. Fails before any
    /// request is made unless every pending call has exactly one output
    /// (see [`validate_tool_outputs`]).
    pub async fn submit(&self, run: &Run, outputs: Vec<ToolOutput>) -> Result<Run, Error> {
        validate_tool_outputs(run.pending_tool_calls(), &outputs)?;
        debug!(run_id = %run.id, outputs = outputs.len(), "submitting tool outputs");
        self.client
            .submit_tool_outputs(
                &run.thread_id,
                &run.id,
                &SubmitToolOutputsRequest::new(outputs),
            )
            .await
    }

    /// Poll, answer required actions through `handler`, and repeat until the
    /// run reaches a terminal status.
    pub async fn drive<H: ToolCallHandler>(&self, mut run: Run, handler: &H) -> Result<Run, Error> {
        loop {
            run = self.poll(run).await?;

            if run.status != RunStatus::RequiresAction {
                info!(run_id = %run.id, status = ?run.status, "run settled");
                return Ok(run);
            }

            let calls = run.pending_tool_calls().to_vec();
            if calls.is_empty() {
                return Err(Error::MalformedPayload {
                    reason: "run requires action but has no tool calls to submit".into(),
                    snippet: run.id.clone(),
                });
            }

            info!(run_id = %run.id, calls = calls.len(), "run requires action");
            let outputs = handler.handle(calls).await?;
            run = self.submit(&run, outputs).await?;
        }
    }

    /// [`start`](Self::start) followed by [`drive`](Self::drive).
    pub async fn create_and_drive<H: ToolCallHandler>(
        &self,
        thread_id: &str,
        request: &RunRequest,
        handler: &H,
    ) -> Result<Run, Error> {
        let run = self.start(thread_id, request).await?;
        self.drive(run, handler).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::{Value, json};
    use tokio::time::Instant;

    use super::*;
    use crate::client::testing::{ScriptedTransport, respond};
    use crate::config::OpenAIConfig;

    const INTERVAL: Duration = Duration::from_millis(500);

    fn run_json(status: &str) -> Value {
        json!({
            "id": "run_1",
            "object": "thread.run",
            "created_at": 1718000000,
            "thread_id": "thread_1",
            "assistant_id": "asst_1",
            "status": status,
            "model": "gpt-4o",
            "tools": [{"type": "function", "function": {"name": "lookup"}}]
        })
    }

    fn requires_action(ids: &[&str]) -> Value {
        let calls: Vec<Value> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "type": "function",
                    "function": {"name": "lookup", "arguments": format!("{{\"key\":\"{id}\"}}")}
                })
            })
            .collect();
        let mut run = run_json("requires_action");
        run["required_action"] = json!({
            "type": "submit_tool_outputs",
            "submit_tool_outputs": {"tool_calls": calls}
        });
        run
    }

    fn driver(transport: &ScriptedTransport) -> RunDriver {
        RunDriver::new(Client::with_transport(
            OpenAIConfig::new("sk-test"),
            transport.clone(),
        ))
        .with_poll_interval(INTERVAL)
    }

    fn decode_run(value: Value) -> Run {
        assist_codec::decode(value.to_string().as_bytes()).expect("run fixture")
    }

    #[tokio::test(start_paused = true)]
    async fn drive_polls_answers_and_settles() {
        let transport = ScriptedTransport::new([
            respond(200, run_json("queued")),
            respond(200, run_json("queued")),
            respond(200, run_json("in_progress")),
            respond(200, requires_action(&["c1", "c2"])),
            respond(200, run_json("in_progress")),
            respond(200, run_json("completed")),
        ]);
        let driver = driver(&transport);

        let handled = Arc::new(AtomicUsize::new(0));
        let handler = {
            let handled = Arc::clone(&handled);
            move |calls: Vec<ToolCall>| {
                let handled = Arc::clone(&handled);
                async move {
                    handled.fetch_add(1, Ordering::SeqCst);
                    let outputs: Vec<ToolOutput> = calls
                        .iter()
                        .map(|call| ToolOutput::new(call.id(), format!("result for {}", call.id())))
                        .collect();
                    Ok::<_, Error>(outputs)
                }
            }
        };

        let started = Instant::now();
        let run = driver
            .create_and_drive("thread_1", &RunRequest::new("asst_1"), &handler)
            .await
            .expect("drive");

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), INTERVAL * 4);
        assert_eq!(transport.remaining(), 0);

        let runs = "/v1/threads/thread_1/runs".to_string();
        let run_path = "/v1/threads/thread_1/runs/run_1".to_string();
        let submit_path = "/v1/threads/thread_1/runs/run_1/submit_tool_outputs".to_string();
        assert_eq!(
            transport.calls(),
            [
                ("POST".to_string(), runs),
                ("GET".to_string(), run_path.clone()),
                ("GET".to_string(), run_path.clone()),
                ("GET".to_string(), run_path.clone()),
                ("POST".to_string(), submit_path),
                ("GET".to_string(), run_path),
            ]
        );

        let submitted = &transport.requests()[4];
        let body: Value =
            serde_json::from_slice(submitted.body.as_deref().expect("body")).expect("json");
        assert_eq!(
            body,
            json!({"tool_outputs": [
                {"tool_call_id": "c1", "output": "result for c1"},
                {"tool_call_id": "c2", "output": "result for c2"}
            ]})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn partial_outputs_are_rejected_without_a_request() {
        let transport = ScriptedTransport::default();
        let driver = driver(&transport);
        let run = decode_run(requires_action(&["c1", "c2"]));

        let err = driver
            .submit(&run, vec![ToolOutput::new("c1", "done")])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::IncompleteToolOutputs { ref missing } if missing == &["c2"]));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_outputs_are_rejected_without_a_request() {
        let transport = ScriptedTransport::default();
        let driver = driver(&transport);
        let run = decode_run(requires_action(&["c1"]));

        let err = driver
            .submit(
                &run,
                vec![ToolOutput::new("c1", "first"), ToolOutput::new("c1", "second")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnexpectedToolOutputs { ref ids } if ids == &["c1"]));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn handler_missing_an_output_aborts_the_drive() {
        let transport = ScriptedTransport::new([respond(200, requires_action(&["c1", "c2"]))]);
        let driver = driver(&transport);
        let run = decode_run(run_json("queued"));

        let handler = |calls: Vec<ToolCall>| async move {
            Ok::<_, Error>(vec![ToolOutput::new(calls[0].id(), "only one")])
        };
        let err = driver.drive(run, &handler).await.unwrap_err();

        assert!(matches!(err, Error::IncompleteToolOutputs { .. }));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_is_a_terminal_snapshot() {
        let mut failed = run_json("failed");
        failed["last_error"] = json!({"code": "server_error", "message": "Something went wrong."});
        let transport = ScriptedTransport::new([respond(200, failed)]);
        let driver = driver(&transport);

        let run = driver
            .poll(decode_run(run_json("in_progress")))
            .await
            .expect("terminal run");

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(
            run.last_error.map(|e| e.message),
            Some("Something went wrong.".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_keeps_polling_until_cancelled() {
        let transport = ScriptedTransport::new([
            respond(200, run_json("cancelling")),
            respond(200, run_json("cancelled")),
        ]);
        let driver = driver(&transport);

        let run = driver
            .poll(decode_run(run_json("cancelling")))
            .await
            .expect("poll");

        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_run_is_not_polled() {
        let transport = ScriptedTransport::default();
        let driver = driver(&transport);

        let started = Instant::now();
        let run = driver
            .poll(decode_run(run_json("expired")))
            .await
            .expect("poll");

        assert_eq!(run.status, RunStatus::Expired);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn decode_error_while_polling_aborts() {
        let transport = ScriptedTransport::new([respond(200, run_json("paused"))]);
        let driver = driver(&transport);

        let err = driver
            .poll(decode_run(run_json("queued")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownVariant { ref tag } if tag == "paused"));
    }

    #[tokio::test(start_paused = true)]
    async fn api_error_while_polling_aborts() {
        let transport = ScriptedTransport::new([respond(
            500,
            json!({"error": {"code": null, "message": "The server had an error", "type": "server_error"}}),
        )]);
        let driver = driver(&transport);

        let err = driver
            .poll(decode_run(run_json("in_progress")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api(ref api) if api.kind == "server_error"));
    }

    #[tokio::test(start_paused = true)]
    async fn requires_action_without_tool_calls_is_malformed() {
        let transport = ScriptedTransport::new([respond(200, run_json("requires_action"))]);
        let driver = driver(&transport);
        let handler = |_calls: Vec<ToolCall>| async { Ok::<_, Error>(Vec::new()) };

        let err = driver
            .drive(decode_run(run_json("queued")), &handler)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_stops_polling_without_cancelling() {
        let transport =
            ScriptedTransport::new((0..10).map(|_| respond(200, run_json("in_progress"))));
        let driver = driver(&transport);

        let outcome = tokio::time::timeout(
            INTERVAL * 3 + INTERVAL / 2,
            driver.poll(decode_run(run_json("in_progress"))),
        )
        .await;

        assert!(outcome.is_err());
        let calls = transport.calls();
        assert!(!calls.is_empty());
        assert!(calls.iter().all(|(method, _)| method == "GET"));
    }
}
