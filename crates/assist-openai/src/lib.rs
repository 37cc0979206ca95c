//! # assist-openai
//!
//! Typed requests and responses for the OpenAI chat, thread, run and file
//! endpoints, plus a [`RunDriver`] that takes a run from creation through
//! tool-call round trips to a terminal state.
//!
//! Endpoint modules ([`chat`], [`threads`], [`runs`], [`files`]) only build
//! [`ApiRequest`] values. A [`Client`] executes them through a [`Transport`]
//! and decodes the response.
//!
//! ```no_run
//! use assist_openai::{Client, Message, RunDriver, RunRequest, ThreadRequest, ToolCall, ToolOutput};
//!
//! # async fn run() -> Result<(), assist_openai::Error> {
//! let client = Client::from_env();
//! let thread = client
//!     .create_thread(Some(&ThreadRequest::with_messages(vec![Message::user("Hello")])))
//!     .await?;
//!
//! let handler = |calls: Vec<ToolCall>| async move {
//!     let outputs: Vec<ToolOutput> = calls.iter().map(|c| ToolOutput::new(c.id(), "{}")).collect();
//!     Ok::<_, assist_openai::Error>(outputs)
//! };
//! let run = RunDriver::new(client)
//!     .create_and_drive(&thread.id, &RunRequest::new("asst_123"), &handler)
//!     .await?;
//! println!("{:?}", run.status);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod client;
pub mod common;
pub mod config;
pub mod content;
pub mod driver;
pub mod error;
pub mod files;
pub mod request;
pub mod runs;
pub mod threads;
pub mod tools;
pub mod transport;

pub use chat::{ChatCompletion, ChatCompletionRequest, ChatMessage};
pub use client::Client;
pub use common::{DeletionStatus, List, Usage};
pub use config::OpenAIConfig;
pub use content::{Content, ContentPart, Detail};
pub use driver::{DEFAULT_POLL_INTERVAL, RunDriver, ToolCallHandler};
pub use error::{ApiError, Error, ErrorResponse};
pub use files::File;
pub use request::ApiRequest;
pub use runs::{Run, RunRequest, RunStatus, ToolOutput};
pub use threads::{Message, Thread, ThreadRequest};
pub use tools::{FunctionCall, FunctionTool, Parameters, ResponseFormat, Tool, ToolCall, ToolChoice};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
