//! CLI binary for edgequake-pdf2pptx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2pptx::{
    convert, detect_document_language, ConversionConfig, ConversionProgressCallback,
    ConversionStats, Deck, LanguageChoice, ProgressCallback, PromptTemplates, Settings,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar over groups. Groups finish out of order, so the bar
/// only counts completions.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` tells us the group count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {msg}  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Summarising");
        self.bar.set_message(format!("Part 0/{total}"));
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_groups: usize) {
        self.activate_bar(total_groups);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Summarising {total_groups} parts…"))
        ));
    }

    fn on_group_complete(&self, done: usize, _total: usize, message: &str) {
        self.bar.set_position(done as u64);
        self.bar.set_message(message.to_string());
    }

    fn on_conversion_complete(&self, _total_groups: usize, total_slides: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} slides generated",
            green("✔"),
            bold(&total_slides.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise into report_summary.pptx in the current directory
  pdf2pptx report.pdf

  # Three pages per slide, answer in German
  pdf2pptx --pages-per-slide 3 --language German report.pdf -o deck.pptx

  # Keep the document's own language
  pdf2pptx --language original paper.pdf

  # Custom settings and prompt templates
  pdf2pptx --settings settings.json --prompts-dir prompts/ report.pdf

  # Detect the document language only (no API key needed)
  pdf2pptx --detect-only report.pdf

  # Stats and slide outline as JSON
  pdf2pptx --json report.pdf > outline.json

SETTINGS FILE (JSON, every key optional):
  {
    "languages": { "English": "en", "German": "de", "Spanish": "es", "Chinese": "zh" },
    "font_size": 24,             capped at 32
    "max_words_per_bullet": 10,
    "max_words_title": 4,
    "min_image_score": 5.0,      images scoring lower are not placed
    "pages_per_slide": 1
  }

PROMPTS DIRECTORY:
  summarize.txt, title.txt, image_eval.txt. Missing files use the built-in
  prompts. {max_words} and {language} are substituted in the first two.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to the libpdfium shared library
"#;

/// Summarise PDF documents into PowerPoint decks using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2pptx",
    version,
    about = "Summarise PDF documents into PowerPoint decks using LLMs",
    long_about = "Summarise a PDF into a slide deck: one slide per page (or per group of pages) \
with a short title, bullet points and the most relevant picture from the pages. Supports OpenAI, \
Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Output .pptx path. Default: <input stem>_summary.pptx in the current directory.
    #[arg(short, long, env = "PDF2PPTX_OUTPUT")]
    output: Option<PathBuf>,

    /// Settings JSON file. Missing file: built-in defaults.
    #[arg(long, env = "PDF2PPTX_SETTINGS", default_value = "settings.json")]
    settings: PathBuf,

    /// Directory with summarize.txt / title.txt / image_eval.txt.
    #[arg(long, env = "PDF2PPTX_PROMPTS_DIR")]
    prompts_dir: Option<PathBuf>,

    /// Output language: auto, original, a settings display name, or a code.
    #[arg(long, env = "PDF2PPTX_LANGUAGE", default_value = "auto")]
    language: String,

    /// Pages summarised per slide (overrides the settings file).
    #[arg(long, env = "PDF2PPTX_PAGES_PER_SLIDE",
          value_parser = clap::value_parser!(u32).range(1..))]
    pages_per_slide: Option<u32>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Maximum LLM calls in flight (also the number of groups summarised at once).
    #[arg(short, long, env = "PDF2PPTX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2PPTX_PASSWORD")]
    password: Option<String>,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "PDF2PPTX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Print the detected document language only, no conversion.
    #[arg(long)]
    detect_only: bool,

    /// Print stats and the slide outline as JSON on stdout.
    #[arg(long, env = "PDF2PPTX_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2PPTX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PPTX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PPTX_QUIET")]
    quiet: bool,
}

/// One slide in the `--json` outline.
#[derive(Serialize)]
struct OutlineSlide<'a> {
    title: &'a str,
    bullets: &'a [String],
    has_image: bool,
    continuation: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    output: &'a Path,
    stats: &'a ConversionStats,
    slides: Vec<OutlineSlide<'a>>,
}

fn outline(deck: &Deck) -> Vec<OutlineSlide<'_>> {
    deck.slides
        .iter()
        .map(|s| OutlineSlide {
            title: &s.title,
            bullets: &s.bullets,
            has_image: s.image.is_some(),
            continuation: s.continuation,
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.detect_only;
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

    let settings = Settings::load(&cli.settings)
        .with_context(|| format!("Failed to load settings from {:?}", cli.settings))?;

    // ── Detect-only mode ─────────────────────────────────────────────────
    if cli.detect_only {
        let code = detect_document_language(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to detect document language")?;
        let name = settings.language_name(&code);
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "language": code, "name": name })
            );
        } else {
            println!("{}  {}", code, name.unwrap_or(""));
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, settings, progress_cb)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    let deck = &output.deck;
    let write_path = output_path.clone();
    let write_settings = config.settings.clone();
    let write_deck = deck.clone();
    tokio::task::spawn_blocking(move || write_deck.write_to(&write_path, &write_settings))
        .await
        .context("Write task failed")?
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let stats = &output.stats;
    if cli.json {
        let report = JsonReport {
            output: &output_path,
            stats,
            slides: outline(deck),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise output")?
        );
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} pages → {} slides ({} with images)  {}ms  →  {}",
            if stats.failed_calls == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.total_pages,
            stats.total_slides,
            stats.slides_with_images,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "language {} (detected {}), {} failed calls",
                stats.language.as_deref().unwrap_or("original"),
                stats.detected_language,
                stats.failed_calls
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    settings: Settings,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let prompts = match cli.prompts_dir {
        Some(ref dir) => PromptTemplates::load_dir(dir)
            .with_context(|| format!("Failed to read prompts from {:?}", dir))?,
        None => PromptTemplates::default(),
    };

    let mut builder = ConversionConfig::builder()
        .settings(settings)
        .prompts(prompts)
        .language(parse_language(&cli.language))
        .concurrency(cli.concurrency)
        .api_timeout_secs(cli.api_timeout);

    if let Some(n) = cli.pages_per_slide {
        builder = builder.pages_per_slide(n as usize);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--language` into a [`LanguageChoice`].
fn parse_language(s: &str) -> LanguageChoice {
    match s.trim().to_lowercase().as_str() {
        "" | "auto" | "detect" => LanguageChoice::Detect,
        "original" => LanguageChoice::Original,
        _ => LanguageChoice::Named(s.trim().to_string()),
    }
}

/// `<stem>_summary.pptx` in the current directory.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from(format!("{stem}_summary.pptx"))
}
