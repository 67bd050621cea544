//! Conversion entry points.
//!
//! [`convert`] runs the whole pipeline and returns the deck in memory;
//! [`convert_to_file`] additionally writes it as a `.pptx`. The
//! provider-independent core is [`build_deck`], which takes already
//! extracted pages and any [`GenerativeService`].

use crate::config::{ConversionConfig, DEFAULT_MODEL};
use crate::error::SlidesError;
use crate::output::{ConversionOutput, ConversionStats, Deck, DeckStats, Page, SlideContent};
use crate::pipeline::enrich::Enricher;
use crate::pipeline::service::{GenerativeService, LlmProviderService};
use crate::pipeline::{assemble, extract, group, input, language, paginate, select};
use crate::prompts::ORIGINAL_LANGUAGE;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file to a slide deck.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` once extraction succeeded, even if some service
/// calls failed (check `output.stats.failed_calls`).
///
/// # Errors
/// Returns `Err(SlidesError)` only for fatal errors:
/// - File not found / permission denied / not a PDF
/// - Unreadable, corrupt or locked document
/// - No provider could be configured
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SlidesError> {
    let total_start = Instant::now();
    let input_path = input_path.as_ref();
    info!("Starting conversion: {}", input_path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let pdf_path = input::resolve_input(input_path)?;

    // ── Step 2: Get/create service ───────────────────────────────────────
    let service = resolve_service(config)?;

    // ── Step 3: Extract pages ────────────────────────────────────────────
    let extract_start = Instant::now();
    let pages = extract::extract_pages(&pdf_path, config.password.as_deref()).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    let total_pages = pages.len();
    info!(
        "Extracted {} pages ({} images) in {}ms",
        total_pages,
        extract::count_images(&pages),
        extract_duration_ms
    );

    // ── Step 4: Detect language ──────────────────────────────────────────
    let (pages, detected) = detect_in_background(pages).await?;
    let language = config.language.resolve(&detected, &config.settings);
    info!(
        "Detected language: {}; prompting in {}",
        detected,
        language.as_deref().unwrap_or(ORIGINAL_LANGUAGE)
    );

    // ── Step 5: Enrich and lay out ───────────────────────────────────────
    let enrich_start = Instant::now();
    let (deck, deck_stats) = build_deck(pages, language.as_deref(), service.as_ref(), config).await;
    let enrich_duration_ms = enrich_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        total_pages,
        total_groups: deck_stats.total_groups,
        total_slides: deck_stats.total_slides,
        slides_with_images: deck_stats.slides_with_images,
        failed_calls: deck_stats.failed_calls,
        language,
        detected_language: detected,
        extract_duration_ms,
        enrich_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages → {} slides ({} with images, {} failed calls), {}ms total",
        stats.total_pages,
        stats.total_slides,
        stats.slides_with_images,
        stats.failed_calls,
        stats.total_duration_ms
    );

    Ok(ConversionOutput { deck, stats })
}

/// Convert a PDF and write the deck to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, SlidesError> {
    let output = convert(input_path, config).await?;
    let path = output_path.as_ref().to_path_buf();
    let settings = config.settings.clone();
    let deck = output.deck;

    tokio::task::spawn_blocking(move || deck.write_to(&path, &settings))
        .await
        .map_err(|e| SlidesError::Internal(format!("Write task panicked: {}", e)))??;

    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, SlidesError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SlidesError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_path, config))
}

/// Convert PDF bytes in memory.
///
/// `bytes` are written to a managed [`tempfile`] which is removed on return.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2pptx::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("report.pdf")?;
/// let output = convert_from_bytes(&bytes, &ConversionConfig::default()).await?;
/// println!("{} slides", output.deck.len());
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, SlidesError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| SlidesError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| SlidesError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(tmp.path(), config).await
}

/// Detect the predominant language of a PDF as an ISO 639-1 code.
///
/// Does not require an LLM provider or API key.
pub async fn detect_document_language(
    input_path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<String, SlidesError> {
    let pdf_path = input::resolve_input(input_path)?;
    let pages = extract::extract_pages(&pdf_path, password).await?;
    let (_, code) = detect_in_background(pages).await?;
    Ok(code)
}

/// Enrich, select and paginate already extracted pages.
///
/// Groups are processed concurrently and reassembled in group order; at
/// most `config.concurrency` service calls are in flight at any moment. Service failures degrade individual
/// fields and never abort the run.
pub async fn build_deck(
    pages: Vec<Page>,
    language: Option<&str>,
    service: &dyn GenerativeService,
    config: &ConversionConfig,
) -> (Deck, DeckStats) {
    let groups = group::group_pages(pages, config.settings.pages_per_slide.max(1));
    let total = groups.len();
    debug!("{} groups of up to {} pages", total, config.settings.pages_per_slide);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    let enricher = Enricher::new(service, config, language);
    let min_score = config.settings.min_image_score;

    let mut finished = stream::iter(groups.iter().map(|group| {
        let enricher = &enricher;
        async move {
            let summary = enricher.enrich(group).await;
            let image = select::select_image(group.images(), &summary.scores, min_score)
                .map(|picked| {
                    debug!("Group {}: picked image with score {}", group.index + 1, picked.score);
                    picked.image.clone()
                });
            let slides = paginate::paginate(group.index, &summary.title, summary.bullets, image);
            (group.index, slides, summary.failed_calls)
        }
    }))
    .buffer_unordered(config.concurrency.max(1));

    let mut results: Vec<(usize, Vec<SlideContent>)> = Vec::with_capacity(total);
    let mut failed_calls = 0;
    while let Some((index, slides, failed)) = finished.next().await {
        failed_calls += failed;
        results.push((index, slides));
        let done = results.len();
        info!("Part {}/{}", done, total);
        if let Some(ref cb) = config.progress_callback {
            cb.on_group_complete(done, total, &format!("Part {done}/{total}"));
        }
    }

    // Sort by group index for consistent output
    results.sort_by_key(|(index, _)| *index);
    let deck = assemble::assemble(results.into_iter().map(|(_, slides)| slides).collect());

    let stats = DeckStats {
        total_groups: total,
        total_slides: deck.len(),
        slides_with_images: deck.slides_with_images(),
        failed_calls,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, stats.total_slides);
    }

    (deck, stats)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run language detection off the async threads; hands the pages back.
async fn detect_in_background(pages: Vec<Page>) -> Result<(Vec<Page>, String), SlidesError> {
    tokio::task::spawn_blocking(move || {
        let code = language::detect_language(&pages);
        (pages, code)
    })
    .await
    .map_err(|e| SlidesError::Internal(format!("Language detection task panicked: {}", e)))
}

/// The service used for enrichment: an injected one, or an
/// [`LlmProviderService`] over the resolved provider.
fn resolve_service(config: &ConversionConfig) -> Result<Arc<dyn GenerativeService>, SlidesError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }
    let provider = resolve_provider(config)?;
    info!(
        "Using provider {} with model {}",
        config.provider_name.as_deref().unwrap_or("auto"),
        config.model_id()
    );
    Ok(Arc::new(LlmProviderService::new(
        provider,
        config.temperature,
        config.api_timeout_secs,
    )))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SlidesError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SlidesError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    honoured even when several API keys are present.
/// 4. **`OPENAI_API_KEY`**, then full auto-detection
///    (`ProviderFactory::from_env`).
fn resolve_provider(config: &ConversionConfig) -> Result<Arc<dyn LLMProvider>, SlidesError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    // 3) EDGEQUAKE_LLM_PROVIDER + EDGEQUAKE_MODEL when both set
    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    // 4) Prefer OpenAI when its key is present
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SlidesError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pipeline::service::{ChatRequest, ServiceReply};
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl GenerativeService for Silent {
        async fn complete(&self, _request: &ChatRequest) -> ServiceReply {
            Err(ServiceError::Api {
                detail: "offline".into(),
            })
        }
    }

    #[tokio::test]
    async fn injected_service_wins() {
        let config = ConversionConfig::builder()
            .service(Arc::new(Silent))
            .build()
            .unwrap();
        assert!(resolve_service(&config).is_ok());
    }

    #[tokio::test]
    async fn empty_document_gives_empty_deck() {
        let config = ConversionConfig::default();
        let (deck, stats) = build_deck(Vec::new(), None, &Silent, &config).await;
        assert!(deck.is_empty());
        assert_eq!(stats, DeckStats::default());
    }

    #[tokio::test]
    async fn missing_input_fails_before_provider_lookup() {
        let config = ConversionConfig::default();
        let err = convert("/no/such/file.pdf", &config).await.unwrap_err();
        assert!(matches!(err, SlidesError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn detection_runs_off_thread() {
        let pages = vec![Page {
            number: 1,
            text: "Die Katze schläft auf dem warmen Sofa und träumt von Mäusen.".into(),
            images: vec![],
        }];
        let (pages, code) = detect_in_background(pages).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(code, "de");
    }
}
