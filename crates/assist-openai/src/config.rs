use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Header that opts into preview endpoints.
pub const BETA_HEADER: &str = "OpenAI-Beta";

/// Beta value required by the thread, run and assistant endpoints.
pub const ASSISTANTS_BETA: &str = "assistants=v2";

/// Configuration shared by every request.
///
/// Built once and shared read-only (the [`Client`](crate::Client) keeps it
/// behind an `Arc`). The API key is not validated; an empty key produces
/// requests the service will reject.
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Host without the `/v1` prefix, e.g. `https://api.openai.com`.
    pub base_url: String,
    /// Value sent in the `OpenAI-Beta` header on assistants endpoints.
    /// `None` omits the header.
    pub beta: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.into(),
            beta: Some(ASSISTANTS_BETA.into()),
        }
    }
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL` from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var("OPENAI_API_KEY").unwrap_or_default());
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }

    /// Headers for an endpoint in the given family.
    pub(crate) fn headers(&self, family: Family) -> Vec<(String, String)> {
        let mut headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )];
        if family == Family::Assistants
            && let Some(beta) = &self.beta
        {
            headers.push((BETA_HEADER.to_string(), beta.clone()));
        }
        headers
    }
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("beta", &self.beta)
            .finish()
    }
}

/// Endpoint family, deciding which optional headers apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    /// Chat, files.
    Base,
    /// Threads, runs, assistants.
    Assistants,
}
