//! Request entry points: one upload in, one extraction result out.
//!
//! A request runs strictly in order and stops at the first failure:
//!
//! ```text
//! kind check ─▶ prompt check ─▶ extract ─▶ empty? ─▶ complete ─▶ clean ─▶ parse
//! ```
//!
//! Rendering the PDF report is a separate step ([`render_output`] /
//! [`write_report`]) so a render failure never loses the textual result
//! the caller already holds.

use crate::config::{credential_env_var, ensure_credential, ReportConfig, DEFAULT_MODEL};
use crate::error::Doc2ReportError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::extract::extract_text;
use crate::pipeline::input::Upload;
use crate::pipeline::llm::{CompletionClient, CompletionRequest, ProviderClient};
use crate::pipeline::postprocess::clean_reply;
use crate::pipeline::render::{render_report, RenderedReport};
use crate::pipeline::sections::parse_sections;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract structured information from a local `.docx` / `.pdf` file.
///
/// The provider and its credential are resolved first; a missing credential
/// stops the request before the file is even read.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2report::{process_file, ReportConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ReportConfig::default();
/// let output = process_file("de_cuong.docx", &config).await?;
/// for section in &output.sections {
///     println!("{}: {}", section.label, section.content.join(" "));
/// }
/// # Ok(())
/// # }
/// ```
pub async fn process_file(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ExtractionOutput, Doc2ReportError> {
    let resolved = resolve_provider(config)?;
    let upload = Upload::from_path(path).await?;
    let client = ProviderClient::new(resolved.provider, resolved.model, config.api_timeout_secs);
    process_upload(&upload, config, &client).await
}

/// Synchronous wrapper around [`process_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_file_sync(
    path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ExtractionOutput, Doc2ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_file(path, config))
}

/// Run one request for an upload already in memory.
///
/// `client` is called at most once, and never for an unsupported file, an
/// empty prompt or a document without text.
pub async fn process_upload<C: CompletionClient>(
    upload: &Upload,
    config: &ReportConfig,
    client: &C,
) -> Result<ExtractionOutput, Doc2ReportError> {
    let result = run_request(upload, config, client).await;
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_error(&e.to_string());
    }
    result
}

async fn run_request<C: CompletionClient>(
    upload: &Upload,
    config: &ReportConfig,
    client: &C,
) -> Result<ExtractionOutput, Doc2ReportError> {
    let total_start = Instant::now();
    let cb = config.progress_callback.as_ref();

    // ── Step 1: Validate the request ─────────────────────────────────────
    let kind = upload.kind()?;
    let prompt = config.prompt.trim();
    if prompt.is_empty() {
        return Err(Doc2ReportError::PromptEmpty);
    }
    info!("Processing {} ({})", upload.file_name, kind);

    // ── Step 2: Extract text ─────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_extraction_start(&upload.file_name);
    }
    let extract_start = Instant::now();
    let extracted = extract_text(upload, kind).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let document_chars = if extracted.is_blank() {
        0
    } else {
        extracted.char_count()
    };
    if let Some(cb) = cb {
        cb.on_extraction_complete(document_chars);
    }
    if document_chars == 0 {
        return Err(Doc2ReportError::EmptyDocument {
            file_name: upload.file_name.clone(),
        });
    }
    debug!("Extracted {} chars in {}ms", document_chars, extract_duration_ms);

    // ── Step 3: Ask the model ────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_completion_start(client.model_name());
    }
    let request = CompletionRequest::new(extracted.text, prompt, config);
    let llm_start = Instant::now();
    let completion = client.complete(&request).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Clean and parse the reply ────────────────────────────────
    let reply = clean_reply(&completion.content);
    let sections = parse_sections(&reply);
    if let Some(cb) = cb {
        cb.on_completion_complete(reply.len(), sections.len());
    }

    let stats = ExtractionStats {
        extract_duration_ms,
        llm_duration_ms,
        input_tokens: completion.prompt_tokens as u64,
        output_tokens: completion.completion_tokens as u64,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} sections, {}ms total",
        sections.len(),
        stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        file_name: upload.file_name.clone(),
        kind,
        document_chars,
        reply,
        sections,
        stats,
    })
}

/// Render the PDF report for a finished request.
///
/// Font discovery and layout are CPU-bound and run on the blocking pool.
pub async fn render_output(
    output: &ExtractionOutput,
    config: &ReportConfig,
) -> Result<RenderedReport, Doc2ReportError> {
    let report = output.report(config);
    let variant = config.layout;
    let fonts = config.fonts.clone();

    let rendered = tokio::task::spawn_blocking(move || render_report(&report, variant, &fonts))
        .await
        .map_err(|e| Doc2ReportError::Internal(format!("Render task panicked: {}", e)))?;

    match rendered {
        Ok(rendered) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_render_complete(rendered.pages, rendered.bytes.len());
            }
            Ok(rendered)
        }
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_error(&e.to_string());
            }
            Err(e.into())
        }
    }
}

/// Render the report and write it to `dir/<output_file_name>`.
///
/// The bytes are staged in a temp file inside `dir` and renamed into place,
/// so an existing report is never left half-overwritten and no staging file
/// survives a failed write.
pub async fn write_report(
    output: &ExtractionOutput,
    dir: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<PathBuf, Doc2ReportError> {
    let rendered = render_output(output, config).await?;
    let dir = dir.as_ref().to_path_buf();
    let path = dir.join(&config.output_file_name);

    let target = path.clone();
    let pages = rendered.pages;
    tokio::task::spawn_blocking(move || persist_report(&dir, &target, &rendered.bytes))
        .await
        .map_err(|e| Doc2ReportError::Internal(format!("Write task panicked: {}", e)))?
        .map_err(|e| Doc2ReportError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    info!("Wrote {} ({} pages)", path.display(), pages);
    Ok(path)
}

fn persist_report(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut staged = tempfile::Builder::new()
        .prefix(".doc2report-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    // On failure the returned handle is dropped, which deletes the staged file.
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ── Provider resolution ──────────────────────────────────────────────────

/// A provider together with the model name used for logs and callbacks.
pub struct ResolvedProvider {
    pub provider: Arc<dyn LLMProvider>,
    pub model: String,
}

impl ResolvedProvider {
    /// Use the model the provider itself reports.
    fn from_provider(provider: Arc<dyn LLMProvider>) -> Self {
        let model = provider.model().to_string();
        Self { provider, model }
    }
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("model", &self.model)
            .finish()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<ResolvedProvider, Doc2ReportError> {
    ensure_credential(provider_name)?;
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Doc2ReportError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(ResolvedProvider {
        provider,
        model: model.to_string(),
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// Levels 2 to 4 check the provider's credential variable first; when
/// nothing at all is configured the result is
/// [`Doc2ReportError::CredentialMissing`] for OpenAI.
pub fn resolve_provider(config: &ReportConfig) -> Result<ResolvedProvider, Doc2ReportError> {
    let env_model = std::env::var("EDGEQUAKE_MODEL")
        .ok()
        .filter(|m| !m.is_empty());
    let model = config
        .model
        .clone()
        .or_else(|| env_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    if let Some(ref provider) = config.provider {
        let resolved = ResolvedProvider::from_provider(Arc::clone(provider));
        return Ok(match config.model {
            Some(ref model) => ResolvedProvider {
                model: model.clone(),
                ..resolved
            },
            None => resolved,
        });
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, &model);
    }

    if let (Ok(prov), Some(env_model)) = (std::env::var("EDGEQUAKE_LLM_PROVIDER"), env_model) {
        if !prov.is_empty() {
            let model = config.model.clone().unwrap_or(env_model);
            return create_provider(&prov, &model);
        }
    }

    if ensure_credential("openai").is_ok() {
        return create_provider("openai", &model);
    }

    let (provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
        debug!("Provider auto-detection failed: {}", e);
        Doc2ReportError::CredentialMissing {
            provider: "openai".to_string(),
            env_var: credential_env_var("openai")
                .unwrap_or("OPENAI_API_KEY")
                .to_string(),
        }
    })?;

    Ok(ResolvedProvider::from_provider(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompletionError, ExtractionError};
    use crate::pipeline::llm::Completion;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedClient {
        reply: Result<String, CompletionError>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CompletionClient for ScriptedClient {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map(|content| Completion {
                content,
                prompt_tokens: 10,
                completion_tokens: 5,
                duration_ms: 1,
            })
        }
    }

    #[tokio::test]
    async fn unsupported_type_never_reaches_model() {
        let client = ScriptedClient::replying("1. A");
        let upload = Upload::new("notes.txt", b"1. A".to_vec());
        let err = process_upload(&upload, &ReportConfig::default(), &client)
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2ReportError::UnsupportedFileType { .. }));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn empty_prompt_never_reaches_model() {
        let client = ScriptedClient::replying("1. A");
        let config = ReportConfig::builder().prompt("   ").build().unwrap();
        let upload = Upload::new("de_cuong.pdf", b"%PDF-1.7".to_vec());
        let err = process_upload(&upload, &config, &client).await.unwrap_err();
        assert!(matches!(err, Doc2ReportError::PromptEmpty));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn bad_signature_never_reaches_model() {
        let client = ScriptedClient::replying("1. A");
        let upload = Upload::new("de_cuong.docx", b"not a zip".to_vec());
        let err = process_upload(&upload, &ReportConfig::default(), &client)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Doc2ReportError::Extraction(ExtractionError::SignatureMismatch { .. })
        ));
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn persist_replaces_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_information.pdf");
        std::fs::write(&path, b"old").unwrap();

        persist_report(dir.path(), &path, b"%PDF-1.7 new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_persist_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_information.pdf");
        std::fs::create_dir(&path).unwrap();

        assert!(persist_report(dir.path(), &path, b"%PDF-1.7").is_err());

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["extracted_information.pdf"]);
        assert!(path.is_dir());
    }

    #[test]
    fn prebuilt_provider_reports_its_own_model() {
        let config = ReportConfig::builder()
            .provider(Arc::new(edgequake_llm::MockProvider::new()))
            .build()
            .unwrap();
        assert_eq!(resolve_provider(&config).unwrap().model, "mock-model");

        let config = ReportConfig::builder()
            .provider(Arc::new(edgequake_llm::MockProvider::new()))
            .model("gpt-4.1-mini")
            .build()
            .unwrap();
        assert_eq!(resolve_provider(&config).unwrap().model, "gpt-4.1-mini");
    }

    #[test]
    fn detected_provider_keeps_its_model_name() {
        let provider = Arc::new(edgequake_llm::MockProvider::new());
        let resolved = ResolvedProvider::from_provider(provider);
        assert_eq!(resolved.model, "mock-model");
    }

    #[test]
    fn named_provider_without_credential_is_a_hard_stop() {
        if std::env::var("MISTRAL_API_KEY").is_ok() {
            eprintln!("Skipping: MISTRAL_API_KEY is set");
            return;
        }
        let config = ReportConfig::builder()
            .provider_name("mistral")
            .build()
            .unwrap();
        let err = resolve_provider(&config).unwrap_err();
        match err {
            Doc2ReportError::CredentialMissing { env_var, .. } => {
                assert_eq!(env_var, "MISTRAL_API_KEY")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credential_stops_before_reading_file() {
        if std::env::var("MISTRAL_API_KEY").is_ok() {
            return;
        }
        let config = ReportConfig::builder()
            .provider_name("mistral")
            .build()
            .unwrap();
        let err = process_file("/definitely/not/here.pdf", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2ReportError::CredentialMissing { .. }));
    }
}
