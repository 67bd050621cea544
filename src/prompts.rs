//! Prompt templates for title generation, bullet summarisation and image
//! relevance scoring.
//!
//! Templates are plain strings that may contain two placeholders:
//!
//! * `{max_words}` — the word budget for a title or a single bullet
//! * `{language}`  — the language the model should answer in
//!
//! [`render_template`] is the only place that substitutes them. When a
//! language was requested but the template has no `{language}` slot, an
//! explicit instruction sentence is appended instead so custom templates
//! still honour the language choice.
//!
//! Callers override the defaults through
//! [`crate::config::PromptTemplates`]; the constants here are used only when
//! no override is provided.

/// Default system prompt for bullet-point summarisation.
pub const DEFAULT_SUMMARIZE_PROMPT: &str = "\
You summarise document pages for presentation slides.
Summarize the following text into at most 5 concise bullet points.
Each bullet point has at most {max_words} words.
Write one bullet point per line, starting with \"- \".
Do not add an introduction or a conclusion.
Respond in {language}.";

/// Default system prompt for slide titles.
pub const DEFAULT_TITLE_PROMPT: &str = "\
Write a slide title for the following text.
The title has at most {max_words} words.
Reply with the title only, without quotes or punctuation at the end.
Respond in {language}.";

/// Default system prompt for image relevance scoring.
///
/// The model must reply with a bare number so the answer can be parsed as a
/// float; anything else scores 0.
pub const DEFAULT_IMAGE_EVAL_PROMPT: &str = "\
You are given the text of a document section and one image taken from it.
Rate from 0 to 10 how much the image helps to understand the text.
Decorative images, logos and page ornaments score 0.
Reply with a single number and nothing else.";

/// Substitution for `{language}` when no language was requested.
pub const ORIGINAL_LANGUAGE: &str = "the original language";

/// The fixed parameter set a template is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptParams<'a> {
    pub max_words: usize,
    pub language: Option<&'a str>,
}

impl<'a> PromptParams<'a> {
    pub fn new(max_words: usize, language: Option<&'a str>) -> Self {
        Self {
            max_words,
            language: language.filter(|l| !l.trim().is_empty()),
        }
    }
}

/// Render `template` with `params`.
///
/// * `{max_words}` is replaced by the number.
/// * `{language}` is replaced by the requested language, or by
///   [`ORIGINAL_LANGUAGE`] when none was requested.
/// * No `{language}` slot but a language was requested: `"\nRespond in
///   <language>."` is appended.
pub fn render_template(template: &str, params: PromptParams<'_>) -> String {
    let mut prompt = template.replace("{max_words}", &params.max_words.to_string());

    if prompt.contains("{language}") {
        prompt = prompt.replace("{language}", params.language.unwrap_or(ORIGINAL_LANGUAGE));
    } else if let Some(language) = params.language {
        prompt = format!("{prompt}\nRespond in {language}.");
    }

    prompt
}
