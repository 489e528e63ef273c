//! Vision model client configuration.

use serde::{Deserialize, Serialize};

/// Blocking threshold applied to every configured harm category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SafetyThreshold {
    /// Least restrictive setting the API offers
    #[default]
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl SafetyThreshold {
    /// Name used on the wire.
    pub fn api_name(&self) -> &'static str {
        match self {
            SafetyThreshold::BlockNone => "BLOCK_NONE",
            SafetyThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            SafetyThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            SafetyThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "block_none" | "none" => Some(Self::BlockNone),
            "block_only_high" | "high" => Some(Self::BlockOnlyHigh),
            "block_medium_and_above" | "medium" => Some(Self::BlockMediumAndAbove),
            "block_low_and_above" | "low" => Some(Self::BlockLowAndAbove),
            _ => None,
        }
    }
}

/// Content categories the safety filter scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
    CivicIntegrity,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 5] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
        HarmCategory::CivicIntegrity,
    ];

    pub fn api_name(&self) -> &'static str {
        match self {
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
            HarmCategory::CivicIntegrity => "HARM_CATEGORY_CIVIC_INTEGRITY",
        }
    }
}

/// Per-category safety settings sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    #[serde(default)]
    pub threshold: SafetyThreshold,
    #[serde(default = "default_categories")]
    pub categories: Vec<HarmCategory>,
}

fn default_categories() -> Vec<HarmCategory> {
    HarmCategory::ALL.to_vec()
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            threshold: SafetyThreshold::default(),
            categories: default_categories(),
        }
    }
}

/// Configuration for the vision model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name, with or without the `models/` prefix
    #[serde(default = "default_model")]
    pub model: String,
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key (usually from GEMINI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token limit for full checks and cross-checks
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Output token limit for the disclosure form check
    #[serde(default = "default_form_check_max_output_tokens")]
    pub form_check_max_output_tokens: u32,
    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub safety: SafetyPolicy,
}

fn default_model() -> String {
    "models/gemini-2.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_form_check_max_output_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    180
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl LlmConfig {
    /// Base default without env overrides.
    pub fn base_default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            api_key: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            form_check_max_output_tokens: default_form_check_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            safety: SafetyPolicy::default(),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `GEMINI_API_KEY`, or `GOOGLE_API_KEY` as a fallback
    /// - `GEMINI_MODEL`: model name
    /// - `GEMINI_ENDPOINT`: API base URL
    /// - `GEMINI_TIMEOUT_SECS`: HTTP timeout
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) =
            std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("GOOGLE_API_KEY"))
        {
            if !key.trim().is_empty() {
                self.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(val) = std::env::var("GEMINI_MODEL") {
            self.model = val;
        }
        if let Ok(val) = std::env::var("GEMINI_ENDPOINT") {
            self.endpoint = val;
        }
        if let Ok(val) = std::env::var("GEMINI_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.timeout_secs = n;
            }
        }
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Model path as the REST API expects it (`models/<name>`).
    pub fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    /// `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model_path()
        )
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.as_ref().map(|key| {
            let skip = key.chars().count().saturating_sub(4);
            let tail: String = key.chars().skip(skip).collect();
            format!("****{tail}")
        });
        copy
    }
}
