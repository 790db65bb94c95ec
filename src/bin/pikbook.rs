//! CLI binary for pikbook.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PikbookConfig`, asks for the source path when none is given, and renders
//! progress.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pikbook::{
    convert, inspect, FallbackPolicy, ImageSize, PikbookConfig, PikbookProgressCallback,
    ProgressCallback,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar advanced per finished page pair, plus a line
/// for every page whose illustration had to be reused.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(show_bar: bool) -> Arc<Self> {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_prefix("Preparing");
            bar.set_message("Opening PDF…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        } else {
            ProgressBar::hidden()
        };
        Arc::new(Self { bar })
    }

    /// Print above the bar, or straight to stderr when the bar is hidden.
    fn say(&self, line: String) {
        if self.bar.is_hidden() {
            eprintln!("{line}");
        } else {
            self.bar.println(line);
        }
    }
}

impl PikbookProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.say(format!(
            "The total number of pages in the PDF file is: {}",
            bold(&total_pages.to_string())
        ));
        self.say("Starting...".to_string());

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_prefix("Illustrating");
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_index: usize, _total_pages: usize) {
        self.bar.set_message(format!("page {}", page_index + 1));
    }

    fn on_page_complete(&self, _page_index: usize, _total_pages: usize, _reused: bool) {
        self.bar.inc(1);
    }

    fn on_illustration_fallback(&self, page_index: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.say(format!(
            "  {} Page {:>3}: prompt did not work ({})",
            yellow("⚠"),
            page_index + 1,
            dim(&msg)
        ));
    }

    fn on_run_complete(&self, total_pages: usize, reused_count: usize) {
        self.bar.finish_and_clear();
        if reused_count == 0 {
            eprintln!("{} {} pages illustrated", green("✔"), bold(&total_pages.to_string()));
        } else {
            eprintln!(
                "{} {} pages illustrated  ({} reused an earlier illustration)",
                yellow("⚠"),
                bold(&total_pages.to_string()),
                yellow(&reused_count.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask for the PDF path interactively
  pikbook

  # Illustrate a book
  pikbook fable.pdf

  # Stop at the first failed image instead of reusing the previous one
  pikbook --on-image-failure abort fable.pdf

  # Page count only (no API key needed)
  pikbook --inspect-only fable.pdf

OUTPUTS (for fable.pdf):
  fable.log             synthesised prompts and warnings
  fable-images/         image_page0.pdf, image_page1.pdf, …
  fable-pikbook.pdf     every page followed by its illustration

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY        API key for both the completion and the image service
  PDFIUM_LIB_PATH       Path to libpdfium (default: ./ then the system library)
"#;

/// Illustrate every page of a PDF with a generated image.
#[derive(Parser, Debug)]
#[command(
    name = "pikbook",
    version,
    about = "Illustrate every page of a PDF with a generated image",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source PDF. Prompted for interactively when omitted.
    input: Option<PathBuf>,

    /// Completion model used to write image prompts.
    #[arg(long, env = "PIKBOOK_MODEL", default_value = pikbook::config::DEFAULT_MODEL)]
    model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PIKBOOK_PROVIDER")]
    provider: Option<String>,

    /// Image-generation model.
    #[arg(long, env = "PIKBOOK_IMAGE_MODEL", default_value = pikbook::config::DEFAULT_IMAGE_MODEL)]
    image_model: String,

    /// Illustration size as WxH.
    #[arg(long, env = "PIKBOOK_IMAGE_SIZE", default_value = "512x512")]
    image_size: String,

    /// Base URL of an OpenAI-compatible image API.
    #[arg(long, env = "PIKBOOK_IMAGE_API_BASE", default_value = pikbook::config::DEFAULT_IMAGE_API_BASE)]
    image_api_base: String,

    /// Per-image request timeout in seconds.
    #[arg(long, env = "PIKBOOK_IMAGE_TIMEOUT", default_value_t = 120)]
    image_timeout: u64,

    /// Max completion tokens per prompt.
    #[arg(long, env = "PIKBOOK_MAX_TOKENS", default_value_t = 1000)]
    max_tokens: usize,

    /// Completion temperature (0.0–2.0).
    #[arg(long, env = "PIKBOOK_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// What to do when an image request fails.
    #[arg(long, env = "PIKBOOK_ON_IMAGE_FAILURE", value_enum, default_value = "reuse-last")]
    on_image_failure: FallbackArg,

    /// Path to a text file with a custom prompt template.
    #[arg(long, env = "PIKBOOK_PROMPT_TEMPLATE")]
    prompt_template: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PIKBOOK_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PIKBOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Print the page count only, no illustration.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PIKBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PIKBOOK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FallbackArg {
    ReuseLast,
    Abort,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(v: FallbackArg) -> Self {
        match v {
            FallbackArg::ReuseLast => FallbackPolicy::ReuseLast,
            FallbackArg::Abort => FallbackPolicy::Abort,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
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

    let input = match cli.input.clone() {
        Some(path) => path,
        None => ask_for_path().context("Failed to read the PDF path")?,
    };

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let pages = inspect(&input).context("Failed to inspect PDF")?;
        if cli.json {
            println!("{}", serde_json::json!({ "file": input, "pages": pages }));
        } else {
            println!("File:   {}", input.display());
            println!("Pages:  {pages}");
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if cli.quiet {
        None
    } else {
        Some(CliProgressCallback::new(show_progress) as Arc<dyn PikbookProgressCallback>)
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = convert(&input, &config).await.context("Run failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "   {} pages  {}ms  →  {}",
            report.output_page_count(),
            report.duration_ms,
            bold(&report.output.display().to_string()),
        );
        eprintln!("   {}", dim(&format!("log: {}", report.log.display())));
    }

    Ok(())
}

/// Prompt on stdin for the source path.
fn ask_for_path() -> Result<PathBuf> {
    let mut stdout = io::stdout();
    write!(stdout, "Enter the path to the PDF file: ")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let path = line.trim().trim_matches(|c| c == '"' || c == '\'');
    if path.is_empty() {
        anyhow::bail!("No PDF path given");
    }
    Ok(PathBuf::from(path))
}

/// Map CLI args to `PikbookConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PikbookConfig> {
    let image_size: ImageSize = cli
        .image_size
        .parse()
        .context("Invalid --image-size")?;

    let mut builder = PikbookConfig::builder()
        .model(&cli.model)
        .image_model(&cli.image_model)
        .image_size(image_size)
        .image_api_base(&cli.image_api_base)
        .image_timeout_secs(cli.image_timeout)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .fallback(cli.on_image_failure.clone().into());

    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name);
    }
    if let Some(ref path) = cli.prompt_template {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
