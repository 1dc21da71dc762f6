//! CLI binary for edgequake-doc2report.
//!
//! A thin shim over the library crate that maps CLI flags to `ReportConfig`,
//! asks for a missing API key, prints the extracted information and
//! optionally writes the PDF report.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2report::{
    process_file, resolve_provider, write_report, Doc2ReportError, FontSource, LayoutVariant,
    PipelineProgressCallback, ProgressCallback, ReportConfig, Severity,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Exit code when extraction succeeded but the PDF report could not be produced.
const EXIT_RENDER_FAILED: u8 = 2;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner for the running stage and a log
/// line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, file_name: &str) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(file_name.to_string());
    }

    fn on_extraction_complete(&self, chars: usize) {
        if chars > 0 {
            self.bar.println(format!(
                "  {} Document text  {}",
                green("✓"),
                dim(&format!("{chars} chars"))
            ));
        }
    }

    fn on_completion_start(&self, model: &str) {
        self.bar.set_prefix("Asking");
        self.bar.set_message(model.to_string());
    }

    fn on_completion_complete(&self, reply_len: usize, sections: usize) {
        self.bar.println(format!(
            "  {} Model reply    {}",
            green("✓"),
            dim(&format!("{reply_len} chars, {sections} sections"))
        ));
        self.bar.set_prefix("Done");
        self.bar.set_message("");
    }

    fn on_render_complete(&self, pages: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} PDF report     {}",
            green("✓"),
            dim(&format!("{pages} pages, {} KiB", bytes.div_ceil(1024)))
        ));
    }

    // The message itself is printed by `run` once the spinner is cleared.
    fn on_error(&self, _error: &str) {
        self.bar.set_prefix("Failed");
        self.bar.set_message("");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract the default syllabus fields and print them
  doc2report de_cuong.docx

  # Also write the PDF report (./extracted_information.pdf)
  doc2report de_cuong.pdf --pdf

  # Two-column table with page numbers, custom output location
  doc2report de_cuong.pdf --pdf --layout table-footer --output-dir reports

  # Your own prompt
  doc2report syllabus.docx --prompt-file my_prompt.txt

  # JSON output (reply + parsed sections + stats)
  doc2report --json de_cuong.docx > result.json

  # Local model, no API key needed
  doc2report --provider ollama --model llama3.1 de_cuong.docx

LAYOUTS:
  plain          bold label line, indented paragraphs (default)
  heading        heading + body paragraphs
  table          two-column label/value table
  table-footer   table + "Trang p/N" and timestamp on every page

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (asked for interactively when missing)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download

  PDFium (~30 MB) is downloaded automatically the first time a PDF is read
  and cached for later runs.
"#;

/// Extract structured information from Word/PDF documents with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "doc2report",
    version,
    about = "Extract structured information from .docx/.pdf documents with an LLM",
    long_about = "Extract text from a .docx or .pdf document, ask an LLM to pull out the \
requested fields as a numbered list, print the result and optionally render it as a PDF report. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI and local Ollama models.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The .docx or .pdf document to process.
    file: PathBuf,

    /// Extraction prompt (overrides the built-in syllabus prompt).
    #[arg(long, env = "DOC2REPORT_PROMPT", conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the extraction prompt from a text file.
    #[arg(long, env = "DOC2REPORT_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Path to a text file containing a custom system instruction.
    #[arg(long, env = "DOC2REPORT_SYSTEM_PROMPT")]
    system_prompt_file: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, azure, ollama.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOC2REPORT_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DOC2REPORT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DOC2REPORT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Also render the result as a PDF report.
    #[arg(long, env = "DOC2REPORT_PDF")]
    pdf: bool,

    /// Directory for the PDF report.
    #[arg(long, env = "DOC2REPORT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// File name of the PDF report.
    #[arg(long, env = "DOC2REPORT_OUTPUT_NAME", default_value = "extracted_information.pdf")]
    output_name: String,

    /// Report layout.
    #[arg(long, env = "DOC2REPORT_LAYOUT", value_enum, default_value = "plain")]
    layout: LayoutArg,

    /// Report title (defaults to the built-in Vietnamese title).
    #[arg(long, env = "DOC2REPORT_TITLE", conflicts_with = "no_title")]
    title: Option<String>,

    /// Omit the report title.
    #[arg(long)]
    no_title: bool,

    /// Footer text for the table-footer layout (default: generation time).
    #[arg(long, env = "DOC2REPORT_FOOTER")]
    footer: Option<String>,

    /// TrueType font for the report body (default: a system sans-serif).
    #[arg(long, env = "DOC2REPORT_FONT")]
    font: Option<PathBuf>,

    /// TrueType font for labels and headings.
    #[arg(long, env = "DOC2REPORT_BOLD_FONT", requires = "font")]
    bold_font: Option<PathBuf>,

    /// Output structured JSON (ExtractionOutput) instead of the plain reply.
    #[arg(long, env = "DOC2REPORT_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOC2REPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2REPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long, env = "DOC2REPORT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    Plain,
    Heading,
    Table,
    TableFooter,
}

impl From<LayoutArg> for LayoutVariant {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Plain => LayoutVariant::PlainParagraphs,
            LayoutArg::Heading => LayoutVariant::HeadingAndBody,
            LayoutArg::Table => LayoutVariant::LabelValueTable,
            LayoutArg::TableFooter => LayoutVariant::LabelValueTableWithFooter,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and resolve the provider ────────────────────────────
    // Done before the runtime starts: a missing key may be read from the
    // terminal and exported for the provider factory.
    let progress = show_progress.then(CliProgressCallback::new);
    let mut config = build_config(&cli, progress.clone().map(|cb| cb as ProgressCallback))?;

    let resolved = match resolve_provider(&config) {
        Err(Doc2ReportError::CredentialMissing { env_var, .. }) => {
            prompt_for_credential(&env_var, progress.as_deref())?;
            resolve_provider(&config)
        }
        other => other,
    };
    let resolved = match resolved {
        Ok(r) => r,
        Err(e) => {
            if let Some(cb) = &progress {
                cb.finish();
            }
            return Err(e).context("No usable LLM provider");
        }
    };
    config.model = Some(resolved.model);
    config.provider = Some(resolved.provider);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let code = runtime.block_on(run(&cli, &config, progress.as_deref()));
    if let Some(cb) = &progress {
        cb.finish();
    }
    code
}

async fn run(
    cli: &Cli,
    config: &ReportConfig,
    progress: Option<&CliProgressCallback>,
) -> Result<ExitCode> {
    let is_pdf = cli
        .file
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        ensure_pdf_engine(cli.quiet)?;
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let output = match process_file(&cli.file, config).await {
        Ok(output) => output,
        Err(e) if e.severity() == Severity::Warning => {
            if let Some(cb) = progress {
                cb.finish();
            }
            eprintln!("{} {}", yellow("⚠"), e);
            let code = match e {
                Doc2ReportError::EmptyDocument { .. } => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            return Ok(code);
        }
        Err(e) => {
            if let Some(cb) = progress {
                cb.finish();
            }
            return Err(e).context("Extraction failed");
        }
    };

    // ── Print the result ─────────────────────────────────────────────────
    if let Some(cb) = progress {
        cb.bar.suspend(|| print_output(cli, &output))?;
    } else {
        print_output(cli, &output)?;
    }

    // ── Optional PDF report ──────────────────────────────────────────────
    if cli.pdf {
        if let Some(cb) = progress {
            cb.bar.set_prefix("Rendering");
            cb.bar.set_message(config.output_file_name.clone());
        }
        match write_report(&output, &cli.output_dir, config).await {
            Ok(path) => {
                if !cli.quiet {
                    if let Some(cb) = progress {
                        cb.finish();
                    }
                    eprintln!("{}  {}", green("✔"), bold(&path.display().to_string()));
                }
            }
            Err(e) => {
                if let Some(cb) = progress {
                    cb.finish();
                }
                eprintln!("{} {}", red("✘ PDF report failed:"), e);
                return Ok(ExitCode::from(EXIT_RENDER_FAILED));
            }
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn print_output(cli: &Cli, output: &edgequake_doc2report::ExtractionOutput) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        handle
            .write_all(output.reply.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.reply.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

/// Make sure libpdfium is present, downloading it with a progress bar on first use.
fn ensure_pdf_engine(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() || std::env::var_os("PDFIUM_LIB_PATH").is_some() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_and_clear();
    Ok(())
}

/// Ask for a missing API key on the terminal (without echo) and export it
/// for this process.
fn prompt_for_credential(env_var: &str, progress: Option<&CliProgressCallback>) -> Result<()> {
    if !io::stdin().is_terminal() {
        anyhow::bail!("{env_var} is not set and no terminal is available to enter it");
    }

    let read = || -> Result<String> {
        let prompt = format!("{} {} ", yellow("?"), bold(&format!("Enter {env_var}:")));
        rpassword::prompt_password(prompt).context("Failed to read API key")
    };
    let key = match progress {
        Some(cb) => cb.bar.suspend(read)?,
        None => read()?,
    };

    let Some(key) = entered_key(&key) else {
        anyhow::bail!("No API key entered; set {env_var} and try again");
    };
    // Single-threaded at this point: the runtime has not been started yet.
    std::env::set_var(env_var, key);
    Ok(())
}

/// The key as typed, without surrounding whitespace; `None` when blank.
fn entered_key(raw: &str) -> Option<&str> {
    let key = raw.trim();
    (!key.is_empty()).then_some(key)
}

/// Map CLI args to `ReportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReportConfig> {
    let prompt = match (&cli.prompt, &cli.prompt_file) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt from {:?}", path))?,
        ),
        (None, None) => None,
    };

    let system_instruction = cli
        .system_prompt_file
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read system prompt from {:?}", path))
        })
        .transpose()?;

    let fonts = match &cli.font {
        Some(regular) => FontSource::Files {
            regular: regular.clone(),
            bold: cli.bold_font.clone(),
        },
        None => FontSource::System,
    };

    let mut builder = ReportConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .layout(cli.layout.into())
        .fonts(fonts)
        .output_file_name(&cli.output_name);

    if let Some(prompt) = prompt {
        builder = builder.prompt(prompt);
    }
    if let Some(instruction) = system_instruction {
        builder = builder.system_instruction(instruction);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if cli.no_title {
        builder = builder.title(None);
    } else if let Some(ref title) = cli.title {
        builder = builder.title(Some(title.clone()));
    }
    if let Some(ref footer) = cli.footer {
        builder = builder.footer_text(footer);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entered_key_is_trimmed() {
        assert_eq!(entered_key("  sk-test\n"), Some("sk-test"));
        assert_eq!(entered_key(" \t\n"), None);
        assert_eq!(entered_key(""), None);
    }

    #[test]
    fn layout_flag_maps_to_variant() {
        let cli = Cli::parse_from(["doc2report", "a.pdf", "--layout", "table-footer"]);
        assert_eq!(
            LayoutVariant::from(cli.layout),
            LayoutVariant::LabelValueTableWithFooter
        );
    }
}
