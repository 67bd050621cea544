//! # edgequake-pdf2pptx
//!
//! Summarise PDF documents into PowerPoint decks using LLMs.
//!
//! Each page, or a run of `pages_per_slide` consecutive pages, becomes one
//! slide (or a few, when the summary is long): a short title, up to five
//! bullets, and at most one picture taken from the pages themselves, chosen
//! by asking a vision model how well each image illustrates the text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     check path, permissions, %PDF magic
//!  ├─ 2. Extract   text + embedded images per page via pdfium (spawn_blocking)
//!  ├─ 3. Language  detect from a ~1000-char sample (lingua)
//!  ├─ 4. Group     consecutive pages, pages_per_slide at a time
//!  ├─ 5. Enrich    title, bullets and image scores per group (concurrent)
//!  ├─ 6. Select    best image at or above min_image_score
//!  ├─ 7. Paginate  ≤ 5 bullets per slide, "(cont.)" overflow slides
//!  └─ 8. Assemble  ordered deck → .pptx (zip + OOXML)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2pptx::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ConversionConfig::default();
//!     let stats = convert_to_file("report.pdf", "report_summary.pptx", &config).await?;
//!     eprintln!("{} slides, {} failed calls", stats.total_slides, stats.failed_calls);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pptx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2pptx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod pptx;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, LanguageChoice, PromptTemplates, Settings,
};
pub use convert::{
    build_deck, convert, convert_from_bytes, convert_sync, convert_to_file,
    detect_document_language,
};
pub use error::{ServiceError, SlidesError};
pub use output::{
    ConversionOutput, ConversionStats, Deck, DeckStats, Group, GroupSummary, Page, PageImage,
    SlideContent,
};
pub use pipeline::service::{ChatRequest, GenerativeService, LlmProviderService, ServiceReply};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
