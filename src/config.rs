//! Configuration types for document extraction and report rendering.
//!
//! All request behaviour is controlled through [`ReportConfig`], built via
//! its [`ReportConfigBuilder`]. The config is constructed once at start-up and
//! passed by reference into every pipeline function; nothing in the library
//! keeps global state.

use crate::error::Doc2ReportError;
use crate::progress::ProgressCallback;
use crate::prompts::{DEFAULT_EXTRACTION_PROMPT, DEFAULT_OUTPUT_FILE_NAME, DEFAULT_REPORT_TITLE};
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for one extraction request and its PDF report.
///
/// # Example
/// ```rust
/// use edgequake_doc2report::{LayoutVariant, ReportConfig};
///
/// let config = ReportConfig::builder()
///     .model("gpt-4.1-mini")
///     .layout(LayoutVariant::LabelValueTableWithFooter)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] or `EDGEQUAKE_MODEL`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Extraction should stay close to the document wording; 0.3 leaves a
    /// little room for the model to rephrase scattered fields into one line.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// System message. If None, uses [`crate::prompts::DEFAULT_SYSTEM_INSTRUCTION`].
    pub system_instruction: Option<String>,

    /// User-editable extraction prompt. Must not be empty.
    pub prompt: String,

    /// Per-call timeout for the model request in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Presentation of the PDF report. Default: [`LayoutVariant::PlainParagraphs`].
    pub layout: LayoutVariant,

    /// Report title. Default: [`DEFAULT_REPORT_TITLE`]; None omits the title.
    pub title: Option<String>,

    /// Footer text for [`LayoutVariant::LabelValueTableWithFooter`].
    /// If None, the generation timestamp is used.
    pub footer_text: Option<String>,

    /// Where the report fonts come from. Default: system fonts.
    pub fonts: FontSource,

    /// File name of the downloadable report. Default: `extracted_information.pdf`.
    pub output_file_name: String,

    /// Optional observer for stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 4096,
            system_instruction: None,
            prompt: DEFAULT_EXTRACTION_PROMPT.to_string(),
            api_timeout_secs: 60,
            layout: LayoutVariant::default(),
            title: Some(DEFAULT_REPORT_TITLE.to_string()),
            footer_text: None,
            fonts: FontSource::default(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("prompt_chars", &self.prompt.chars().count())
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("layout", &self.layout)
            .field("title", &self.title)
            .field("footer_text", &self.footer_text)
            .field("fonts", &self.fonts)
            .field("output_file_name", &self.output_file_name)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.system_instruction = Some(instruction.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn layout(mut self, layout: LayoutVariant) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.config.title = title;
        self
    }

    pub fn footer_text(mut self, text: impl Into<String>) -> Self {
        self.config.footer_text = Some(text.into());
        self
    }

    pub fn fonts(mut self, fonts: FontSource) -> Self {
        self.config.fonts = fonts;
        self
    }

    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_file_name = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The prompt is not checked here: an empty prompt is a per-request
    /// condition ([`Doc2ReportError::PromptEmpty`]), not a config error.
    pub fn build(self) -> Result<ReportConfig, Doc2ReportError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(Doc2ReportError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(Doc2ReportError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        let name = c.output_file_name.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(Doc2ReportError::InvalidConfig(format!(
                "output file name must be a plain file name, got '{}'",
                c.output_file_name
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How parsed sections are presented in the PDF report.
///
/// | Variant | One section becomes |
/// |---------|---------------------|
/// | `PlainParagraphs` | bold label line + indented paragraphs |
/// | `HeadingAndBody` | heading + body paragraphs |
/// | `LabelValueTable` | one two-column table row |
/// | `LabelValueTableWithFooter` | table row; page number and timestamp on every page |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutVariant {
    #[default]
    PlainParagraphs,
    HeadingAndBody,
    LabelValueTable,
    LabelValueTableWithFooter,
}

impl LayoutVariant {
    /// `true` for the two table layouts.
    pub fn is_table(&self) -> bool {
        matches!(
            self,
            LayoutVariant::LabelValueTable | LayoutVariant::LabelValueTableWithFooter
        )
    }

    /// `true` when a page footer is drawn on every page.
    pub fn has_footer(&self) -> bool {
        matches!(self, LayoutVariant::LabelValueTableWithFooter)
    }
}

/// Where report fonts are loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum FontSource {
    /// Discover a sans-serif face with Vietnamese coverage among system fonts. (default)
    #[default]
    System,
    /// Explicit font files. Without `bold`, labels use the regular face.
    Files {
        regular: PathBuf,
        bold: Option<PathBuf>,
    },
}

// ── Credentials ──────────────────────────────────────────────────────────

/// Environment variable holding the API credential for a provider.
///
/// Returns `None` for local providers that need no credential.
pub fn credential_env_var(provider_name: &str) -> Option<&'static str> {
    match provider_name.to_ascii_lowercase().as_str() {
        "ollama" | "lmstudio" | "mock" => None,
        "anthropic" | "claude" => Some("ANTHROPIC_API_KEY"),
        "gemini" | "google" => Some("GEMINI_API_KEY"),
        "azure" => Some("AZURE_OPENAI_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "xai" => Some("XAI_API_KEY"),
        _ => Some("OPENAI_API_KEY"),
    }
}

/// Check that the credential for `provider_name` is present and non-empty.
///
/// This is the hard stop that runs before any pipeline work.
pub fn ensure_credential(provider_name: &str) -> Result<(), Doc2ReportError> {
    let Some(var) = credential_env_var(provider_name) else {
        return Ok(());
    };
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(Doc2ReportError::CredentialMissing {
            provider: provider_name.to_string(),
            env_var: var.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_syllabus_extraction() {
        let c = ReportConfig::default();
        assert!((c.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(c.output_file_name, "extracted_information.pdf");
        assert_eq!(c.layout, LayoutVariant::PlainParagraphs);
        assert_eq!(c.title.as_deref(), Some(DEFAULT_REPORT_TITLE));
        assert!(c.prompt.contains("1. Tên học phần"));
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ReportConfig::builder().temperature(5.0).build().unwrap();
        assert!((c.temperature - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn builder_rejects_path_like_output_name() {
        let err = ReportConfig::builder()
            .output_file_name("../escape.pdf")
            .build()
            .unwrap_err();
        assert!(matches!(err, Doc2ReportError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ReportConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn empty_prompt_is_not_a_config_error() {
        assert!(ReportConfig::builder().prompt("").build().is_ok());
    }

    #[test]
    fn layout_flags() {
        assert!(LayoutVariant::LabelValueTable.is_table());
        assert!(!LayoutVariant::LabelValueTable.has_footer());
        assert!(LayoutVariant::LabelValueTableWithFooter.has_footer());
        assert!(!LayoutVariant::HeadingAndBody.is_table());
    }

    #[test]
    fn credential_vars() {
        assert_eq!(credential_env_var("openai"), Some("OPENAI_API_KEY"));
        assert_eq!(credential_env_var("Anthropic"), Some("ANTHROPIC_API_KEY"));
        assert_eq!(credential_env_var("gemini"), Some("GEMINI_API_KEY"));
        assert_eq!(credential_env_var("ollama"), None);
    }

    #[test]
    fn local_provider_needs_no_credential() {
        assert!(ensure_credential("ollama").is_ok());
    }

    #[test]
    fn debug_hides_provider() {
        let dbg = format!("{:?}", ReportConfig::default());
        assert!(dbg.contains("ReportConfig"));
        assert!(!dbg.contains("Bạn là"), "prompt text should not be dumped");
    }
}
