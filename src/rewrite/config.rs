/// Default base URL of the text-generation API
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for rewriting
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Configuration for the HTTP note rewriter.
#[derive(Clone)]
pub struct RewriteConfig {
    /// API base URL; the model path is appended to it
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl RewriteConfig {
    /// Create a config for the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            timeout_seconds: 20,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Full URL of the generate call for the configured model
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

// Keep the key out of logs.
impl std::fmt::Debug for RewriteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
