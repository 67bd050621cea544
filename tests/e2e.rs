//! End-to-end integration tests for edgequake-pdf2pptx.
//!
//! These tests use real PDF files in `./test_cases/` and make live LLM API
//! calls. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=./libpdfium.so cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_detect_language -- --nocapture

use async_trait::async_trait;
use edgequake_pdf2pptx::pipeline::extract::{extract_pages, extract_pages_blocking};
use edgequake_pdf2pptx::pptx::count_slides;
use edgequake_pdf2pptx::{
    convert, convert_from_bytes, convert_to_file, detect_document_language, ChatRequest,
    ConversionConfig, ConversionProgressCallback, GenerativeService, LanguageChoice,
    NoopProgressCallback, ServiceReply, SlidesError,
};
use std::path::PathBuf;
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Service for runs that must fail before any call is made.
struct Unreachable;

#[async_trait]
impl GenerativeService for Unreachable {
    async fn complete(&self, _request: &ChatRequest) -> ServiceReply {
        panic!("no service call expected");
    }
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

// ── Input checks (no pdfium, no LLM, always run) ─────────────────────────────

#[tokio::test]
async fn test_detect_language_nonexistent() {
    let result = detect_document_language("/definitely/not/a/real/file.pdf", None).await;
    assert!(matches!(result, Err(SlidesError::FileNotFound { .. })));
}

#[tokio::test]
async fn test_convert_rejects_non_pdf_bytes() {
    let result = convert_from_bytes(b"GIF89a not a pdf", &ConversionConfig::default()).await;
    assert!(matches!(result, Err(SlidesError::NotAPdf { .. })));
}

/// Verify that a Noop callback compiles and does not panic.
#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();

    let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
    cb.on_conversion_start(3);
    cb.on_group_complete(1, 3, "Part 1/3");
    cb.on_conversion_complete(3, 4);
}

// ── Extraction (pdfium, no LLM) ─────────────────────────────────────────────

#[tokio::test]
async fn test_extract_corrupt_body_is_corrupt_pdf() {
    let file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .expect("tempfile");
    std::fs::write(file.path(), b"%PDF-1.7\ngarbage").expect("write");
    let path = e2e_skip_unless_ready!(file.path().to_path_buf());

    let result = extract_pages(&path, None).await;
    assert!(
        matches!(result, Err(SlidesError::CorruptPdf { .. })),
        "got {result:?}"
    );

    // The magic check passes, so the full conversion fails at extraction.
    let config = ConversionConfig::builder()
        .service(Arc::new(Unreachable))
        .build()
        .expect("valid config");
    let result = convert(&path, &config).await;
    assert!(matches!(result, Err(SlidesError::CorruptPdf { .. })));
}

#[tokio::test]
async fn test_extract_pages_numbered_from_one() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let pages = extract_pages(&path, None).await.expect("extraction");

    assert_eq!(pages.len(), 15);
    let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
    let expected: Vec<u32> = (1..=pages.len() as u32).collect();
    assert_eq!(numbers, expected);
    assert!(pages[0].text.contains("Attention"));
}

#[test]
fn test_extract_image_order_is_stable() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let first = extract_pages_blocking(&path, None).expect("first pass");
    let second = extract_pages_blocking(&path, None).expect("second pass");

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        let a_bytes: Vec<&[u8]> = a.images.iter().map(|i| i.bytes.as_slice()).collect();
        let b_bytes: Vec<&[u8]> = b.images.iter().map(|i| i.bytes.as_slice()).collect();
        assert_eq!(a_bytes, b_bytes, "page {} image order differs", a.number);
    }
}

// ── Language detection (pdfium, no LLM) ──────────────────────────────────────

#[tokio::test]
async fn test_detect_language_arxiv_paper() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let code = detect_document_language(&path, None)
        .await
        .expect("detection should succeed");
    assert_eq!(code, "en");
}

// ── Full conversions (live LLM) ──────────────────────────────────────────────

#[tokio::test]
async fn test_convert_arxiv_paper_to_file() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    let out_path = output_dir().join("attention_summary.pptx");

    let config = ConversionConfig::builder()
        .pages_per_slide(3)
        .build()
        .expect("valid config");

    let stats = convert_to_file(&path, &out_path, &config)
        .await
        .expect("conversion should succeed");

    assert_eq!(stats.total_pages, 15);
    assert_eq!(stats.total_groups, 5);
    assert!(stats.total_slides >= stats.total_groups);
    assert_eq!(stats.detected_language, "en");

    let bytes = std::fs::read(&out_path).expect("output written");
    assert_eq!(count_slides(&bytes).unwrap(), stats.total_slides);
    println!("[arxiv] {:?}", stats);
}

#[tokio::test]
async fn test_convert_in_requested_language() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ConversionConfig::builder()
        .pages_per_slide(15)
        .language(LanguageChoice::Named("German".into()))
        .build()
        .expect("valid config");

    let output = convert(&path, &config).await.expect("conversion should succeed");

    assert_eq!(output.stats.language.as_deref(), Some("de"));
    assert_eq!(output.stats.total_groups, 1);
    let first = &output.deck.slides[0];
    assert!(!first.title.is_empty(), "title should not be empty");
    assert!(!first.bullets.is_empty(), "bullets should not be empty");
    println!("[german] {} — {:?}", first.title, first.bullets);
}

#[tokio::test]
async fn test_convert_json_serialisable() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ConversionConfig::builder()
        .pages_per_slide(15)
        .build()
        .expect("valid config");
    let output = convert(&path, &config).await.expect("conversion should succeed");

    let json = serde_json::to_string(&output).expect("serialisable");
    assert!(json.contains("\"total_slides\""));
    assert!(json.contains("\"slides\""));
}
