//! Configuration types for PDF-to-PPTX conversion.
//!
//! Three layers, each read once at the start of a run and never mutated while
//! it executes:
//!
//! * [`Settings`] — layout and summarisation knobs, normally loaded from a
//!   `settings.json` file. Every field has a default used when it is absent.
//! * [`PromptTemplates`] — the three prompt strings, normally loaded from a
//!   prompts directory.
//! * [`ConversionConfig`] — everything else (provider, concurrency, language
//!   choice), built via its [`ConversionConfigBuilder`]. It owns the other
//!   two and is passed by reference through every pipeline stage.

use crate::error::SlidesError;
use crate::pipeline::service::GenerativeService;
use crate::progress::ProgressCallback;
use crate::prompts::{DEFAULT_IMAGE_EVAL_PROMPT, DEFAULT_SUMMARIZE_PROMPT, DEFAULT_TITLE_PROMPT};
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Largest font size the body text box is rendered with, in points.
pub const MAX_FONT_SIZE: u32 = 32;

// ── Settings ─────────────────────────────────────────────────────────────

/// Layout and summarisation settings.
///
/// Deserialises from the same JSON shape the settings file has always used:
///
/// ```json
/// {
///   "languages": { "English": "en", "German": "de" },
///   "font_size": 24,
///   "max_words_per_bullet": 10,
///   "max_words_title": 4,
///   "min_image_score": 5,
///   "pages_per_slide": 1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Display name → language code offered to the user.
    #[serde(rename = "languages")]
    pub language_options: BTreeMap<String, String>,

    /// Body font size in points. Rendered as `min(font_size, 32)`. Default: 24.
    pub font_size: u32,

    /// Word budget per bullet; longer bullets are truncated. Default: 10.
    pub max_words_per_bullet: usize,

    /// Word budget given to the title prompt. Default: 4.
    pub max_words_title: usize,

    /// Minimum relevance score an image needs to be placed. Default: 5.
    pub min_image_score: f32,

    /// Number of consecutive pages summarised together. Default: 1.
    pub pages_per_slide: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let language_options = [
            ("English", "en"),
            ("German", "de"),
            ("Spanish", "es"),
            ("Chinese", "zh"),
        ]
        .into_iter()
        .map(|(name, code)| (name.to_string(), code.to_string()))
        .collect();

        Self {
            language_options,
            font_size: 24,
            max_words_per_bullet: 10,
            max_words_title: 4,
            min_image_score: 5.0,
            pages_per_slide: 1,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    ///
    /// A missing file yields [`Settings::default`]. A file that exists but
    /// cannot be read or parsed is an error: silently falling back would make
    /// a typo in the file invisible.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SlidesError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| SlidesError::SettingsInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let settings: Settings =
            serde_json::from_str(&raw).map_err(|e| SlidesError::SettingsInvalid {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SlidesError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SlidesError::Internal(format!("settings encode: {e}")))?;
        std::fs::write(path, json).map_err(|e| SlidesError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), SlidesError> {
        if self.pages_per_slide == 0 {
            return Err(SlidesError::InvalidConfig(
                "pages_per_slide must be ≥ 1".into(),
            ));
        }
        if self.font_size == 0 {
            return Err(SlidesError::InvalidConfig("font_size must be ≥ 1".into()));
        }
        if self.max_words_per_bullet == 0 || self.max_words_title == 0 {
            return Err(SlidesError::InvalidConfig(
                "max_words_per_bullet and max_words_title must be ≥ 1".into(),
            ));
        }
        if !self.min_image_score.is_finite() {
            return Err(SlidesError::InvalidConfig(
                "min_image_score must be a finite number".into(),
            ));
        }
        Ok(())
    }

    /// Font size actually used for bullet paragraphs.
    pub fn effective_font_size(&self) -> u32 {
        self.font_size.min(MAX_FONT_SIZE)
    }

    /// Look up the display name for a language code.
    pub fn language_name(&self, code: &str) -> Option<&str> {
        self.language_options
            .iter()
            .find(|(_, c)| c.as_str() == code)
            .map(|(name, _)| name.as_str())
    }

    /// Resolve a display name (case-insensitive) to its code.
    pub fn language_code(&self, name: &str) -> Option<&str> {
        self.language_options
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, code)| code.as_str())
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────

/// The three prompt templates used by the enrichment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    /// Bullet summarisation prompt (`summarize.txt`).
    pub summarize: String,
    /// Slide title prompt (`title.txt`).
    pub title: String,
    /// Image relevance prompt (`image_eval.txt`). Used verbatim.
    pub image_eval: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            summarize: DEFAULT_SUMMARIZE_PROMPT.to_string(),
            title: DEFAULT_TITLE_PROMPT.to_string(),
            image_eval: DEFAULT_IMAGE_EVAL_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    pub const SUMMARIZE_FILE: &'static str = "summarize.txt";
    pub const TITLE_FILE: &'static str = "title.txt";
    pub const IMAGE_EVAL_FILE: &'static str = "image_eval.txt";

    /// Load templates from `dir`. Each missing file falls back to its
    /// built-in default; contents are trimmed.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SlidesError> {
        let dir = dir.as_ref();
        let defaults = Self::default();
        Ok(Self {
            summarize: read_prompt(&dir.join(Self::SUMMARIZE_FILE), defaults.summarize)?,
            title: read_prompt(&dir.join(Self::TITLE_FILE), defaults.title)?,
            image_eval: read_prompt(&dir.join(Self::IMAGE_EVAL_FILE), defaults.image_eval)?,
        })
    }

    /// Persist all three templates into `dir`, creating it if needed.
    pub fn save_dir(&self, dir: impl AsRef<Path>) -> Result<(), SlidesError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| SlidesError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        for (file, content) in [
            (Self::SUMMARIZE_FILE, &self.summarize),
            (Self::TITLE_FILE, &self.title),
            (Self::IMAGE_EVAL_FILE, &self.image_eval),
        ] {
            let path = dir.join(file);
            std::fs::write(&path, content)
                .map_err(|e| SlidesError::OutputWriteFailed { path, source: e })?;
        }
        Ok(())
    }
}

fn read_prompt(path: &Path, fallback: String) -> Result<String, SlidesError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s.trim().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Prompt {} missing, using built-in default", path.display());
            Ok(fallback)
        }
        Err(e) => Err(SlidesError::SettingsInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

// ── Language choice ──────────────────────────────────────────────────────

/// Which language the prompts ask the model to answer in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageChoice {
    /// Use the language detected from the document. (default)
    #[default]
    Detect,
    /// Request no language: prompts say "the original language".
    Original,
    /// A display name from [`Settings::language_options`] or a raw code.
    Named(String),
}

impl LanguageChoice {
    /// Resolve to the string substituted into prompts, if any.
    pub fn resolve(&self, detected: &str, settings: &Settings) -> Option<String> {
        match self {
            LanguageChoice::Detect => Some(detected.to_string()),
            LanguageChoice::Original => None,
            LanguageChoice::Named(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(
                    settings
                        .language_code(name)
                        .unwrap_or(name)
                        .to_string(),
                )
            }
        }
    }
}

// ── ConversionConfig ─────────────────────────────────────────────────────

/// Configuration for a PDF-to-PPTX conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2pptx::{ConversionConfig, LanguageChoice};
///
/// let config = ConversionConfig::builder()
///     .pages_per_slide(2)
///     .concurrency(4)
///     .language(LanguageChoice::Named("German".into()))
///     .model("gpt-4.1-nano")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Layout and summarisation settings.
    pub settings: Settings,

    /// Prompt templates.
    pub prompts: PromptTemplates,

    /// Answer language for the generated text. Default: detected language.
    pub language: LanguageChoice,

    /// Model / deployment identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "azure", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed generative service. Takes precedence over everything
    /// provider-related; tests inject scripted services here.
    pub service: Option<Arc<dyn GenerativeService>>,

    /// Number of groups enriched concurrently, and the ceiling on service
    /// calls in flight across the whole run. Default: 4.
    pub concurrency: usize,

    /// Sampling temperature. None leaves the provider default.
    pub temperature: Option<f32>,

    /// Max output tokens for a title request. Default: 16.
    pub title_max_tokens: usize,

    /// Max output tokens for a summary request. Default: 256.
    pub summary_max_tokens: usize,

    /// Max output tokens for an image-score request. Default: 8.
    pub score_max_tokens: usize,

    /// Per-call timeout in seconds; a timed-out call degrades like any other
    /// failure. Default: 60.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional observer notified after each group.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            prompts: PromptTemplates::default(),
            language: LanguageChoice::default(),
            model: None,
            provider_name: None,
            provider: None,
            service: None,
            concurrency: 4,
            temperature: None,
            title_max_tokens: 16,
            summary_max_tokens: 256,
            score_max_tokens: 8,
            api_timeout_secs: 60,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("settings", &self.settings)
            .field("language", &self.language)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("service", &self.service.as_ref().map(|_| "<dyn GenerativeService>"))
            .field("concurrency", &self.concurrency)
            .field("temperature", &self.temperature)
            .field("title_max_tokens", &self.title_max_tokens)
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("score_max_tokens", &self.score_max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model identifier sent with every request.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.config.settings = settings;
        self
    }

    pub fn prompts(mut self, prompts: PromptTemplates) -> Self {
        self.config.prompts = prompts;
        self
    }

    /// Override `settings.pages_per_slide`.
    pub fn pages_per_slide(mut self, n: usize) -> Self {
        self.config.settings.pages_per_slide = n;
        self
    }

    pub fn language(mut self, choice: LanguageChoice) -> Self {
        self.config.language = choice;
        self
    }

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

    pub fn service(mut self, service: Arc<dyn GenerativeService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn title_max_tokens(mut self, n: usize) -> Self {
        self.config.title_max_tokens = n;
        self
    }

    pub fn summary_max_tokens(mut self, n: usize) -> Self {
        self.config.summary_max_tokens = n;
        self
    }

    pub fn score_max_tokens(mut self, n: usize) -> Self {
        self.config.score_max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, SlidesError> {
        let c = &self.config;
        c.settings.validate()?;
        if c.concurrency == 0 {
            return Err(SlidesError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.title_max_tokens == 0 || c.summary_max_tokens == 0 || c.score_max_tokens == 0 {
            return Err(SlidesError::InvalidConfig(
                "Max tokens per request must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.font_size, 24);
        assert_eq!(s.max_words_per_bullet, 10);
        assert_eq!(s.max_words_title, 4);
        assert_eq!(s.min_image_score, 5.0);
        assert_eq!(s.pages_per_slide, 1);
        assert_eq!(s.language_options.get("German").map(String::as_str), Some("de"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"pages_per_slide": 3, "min_image_score": 7}"#)
            .unwrap();
        assert_eq!(s.pages_per_slide, 3);
        assert_eq!(s.min_image_score, 7.0);
        assert_eq!(s.font_size, 24);
        assert_eq!(s.language_options.len(), 4);
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SlidesError::SettingsInvalid { .. }), "got {err:?}");
    }

    #[test]
    fn settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = Settings::default();
        s.font_size = 18;
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn zero_pages_per_slide_rejected() {
        let err = ConversionConfig::builder().pages_per_slide(0).build().unwrap_err();
        assert!(matches!(err, SlidesError::InvalidConfig(_)));
    }

    #[test]
    fn font_size_is_capped() {
        let s = Settings {
            font_size: 40,
            ..Settings::default()
        };
        assert_eq!(s.effective_font_size(), 32);
        assert_eq!(Settings::default().effective_font_size(), 24);
    }

    #[test]
    fn language_lookup_both_ways() {
        let s = Settings::default();
        assert_eq!(s.language_code("spanish"), Some("es"));
        assert_eq!(s.language_name("zh"), Some("Chinese"));
        assert_eq!(s.language_name("fr"), None);
    }

    #[test]
    fn language_choice_resolution() {
        let s = Settings::default();
        assert_eq!(LanguageChoice::Detect.resolve("fr", &s), Some("fr".into()));
        assert_eq!(LanguageChoice::Original.resolve("fr", &s), None);
        assert_eq!(
            LanguageChoice::Named("German".into()).resolve("fr", &s),
            Some("de".into())
        );
        assert_eq!(
            LanguageChoice::Named("it".into()).resolve("fr", &s),
            Some("it".into())
        );
    }

    #[test]
    fn prompt_dir_falls_back_per_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("title.txt"), "  Short title please.\n").unwrap();
        let prompts = PromptTemplates::load_dir(dir.path()).unwrap();
        assert_eq!(prompts.title, "Short title please.");
        assert_eq!(prompts.summarize, DEFAULT_SUMMARIZE_PROMPT);
        assert_eq!(prompts.image_eval, DEFAULT_IMAGE_EVAL_PROMPT);
    }

    #[test]
    fn prompt_dir_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = PromptTemplates {
            summarize: "S {max_words}".into(),
            title: "T".into(),
            image_eval: "I".into(),
        };
        prompts.save_dir(dir.path().join("prompts")).unwrap();
        assert_eq!(PromptTemplates::load_dir(dir.path().join("prompts")).unwrap(), prompts);
    }

    #[test]
    fn model_id_defaults() {
        assert_eq!(ConversionConfig::default().model_id(), DEFAULT_MODEL);
        let c = ConversionConfig::builder().model("my-deployment").build().unwrap();
        assert_eq!(c.model_id(), "my-deployment");
    }
}
