//! Document language detection.
//!
//! Only a short prefix of the document is classified: page texts are
//! accumulated in order until the sample passes [`SAMPLE_CHARS`] characters.
//! The result is advisory (it only parametrises prompts), so every failure
//! mode collapses to [`DEFAULT_LANGUAGE`].

use crate::output::Page;
use lingua::{LanguageDetector, LanguageDetectorBuilder};
use once_cell::sync::Lazy;
use tracing::debug;

/// Code returned when the sample cannot be classified.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Accumulation stops once the sample is longer than this many characters.
pub const SAMPLE_CHARS: usize = 1000;

// Building the detector loads language models; do it once per process.
static DETECTOR: Lazy<LanguageDetector> =
    Lazy::new(|| LanguageDetectorBuilder::from_all_languages().build());

/// Collect the classification sample: page texts joined with a space, in
/// order, stopping as soon as the joined text exceeds [`SAMPLE_CHARS`].
pub fn sample_text(pages: &[Page]) -> String {
    let mut sample = String::new();
    let mut chars = 0usize;
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            sample.push(' ');
            chars += 1;
        }
        sample.push_str(&page.text);
        chars += page.text.chars().count();
        if chars > SAMPLE_CHARS {
            break;
        }
    }
    sample
}

/// Detect the predominant language of `pages` as a lowercase ISO 639-1 code.
pub fn detect_language(pages: &[Page]) -> String {
    let sample = sample_text(pages);
    classify(&sample).unwrap_or_else(|| {
        debug!("Language detection inconclusive, defaulting to {}", DEFAULT_LANGUAGE);
        DEFAULT_LANGUAGE.to_string()
    })
}

fn classify(sample: &str) -> Option<String> {
    if !sample.chars().any(char::is_alphabetic) {
        return None;
    }
    let language = DETECTOR.detect_language_of(sample)?;
    let code = language.iso_code_639_1().to_string().to_lowercase();
    debug!("Detected language {:?} ({})", language, code);
    Some(code)
}
