use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when talking to the OpenAI API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A payload did not match the JSON shape it was decoded as.
    #[error("malformed payload: {reason} (payload: {snippet})")]
    MalformedPayload { reason: String, snippet: String },

    /// A discriminant tag names a variant that is not known.
    #[error("unknown variant `{tag}`")]
    UnknownVariant { tag: String },

    /// The service answered with a structured error body.
    #[error("api error: {0}")]
    Api(ApiError),

    /// The transport itself failed (connection, TLS, body read, ...).
    #[error("http error: {0}")]
    Http(Box<dyn std::error::Error + Send + Sync>),

    /// Non-2xx status without a decodable error body.
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    /// Tool outputs were submitted without covering every pending call.
    #[error("missing tool outputs for calls: {}", missing.join(", "))]
    IncompleteToolOutputs { missing: Vec<String> },

    /// Tool outputs named a call that is not pending, or answered one twice.
    #[error("unexpected tool outputs for calls: {}", ids.join(", "))]
    UnexpectedToolOutputs { ids: Vec<String> },
}

impl From<assist_codec::Error> for Error {
    fn from(err: assist_codec::Error) -> Self {
        match err {
            assist_codec::Error::MalformedPayload { reason, snippet } => {
                Error::MalformedPayload { reason, snippet }
            }
            assist_codec::Error::UnknownVariant { tag } => Error::UnknownVariant { tag },
        }
    }
}

/// Error object returned by the API on failure.
///
/// - Documents: <https://platform.openai.com/docs/guides/error-codes>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl ApiError {
    pub const UNSUPPORTED_COUNTRY_REGION_TERRITORY: &'static str =
        "unsupported_country_region_territory";

    /// The account's region is not served by the API.
    pub fn is_unsupported_region(&self) -> bool {
        self.code.as_deref() == Some(Self::UNSUPPORTED_COUNTRY_REGION_TERRITORY)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Envelope wrapping [`ApiError`] in failed responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}
