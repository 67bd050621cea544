//! Enrichment: title, bullet summary and image relevance scores per group.
//!
//! Every service call is fault isolated. A failed or malformed reply degrades
//! only its own field, through the explicit mappings below:
//!
//! | Call        | Failure value |
//! |-------------|---------------|
//! | title       | `""`          |
//! | bullets     | `[]`          |
//! | image score | `0.0`         |
//!
//! The group is never aborted and nothing is retried. A deck with a few blank
//! titles is more useful than no deck.

use crate::config::ConversionConfig;
use crate::error::ServiceError;
use crate::output::{Group, GroupSummary, PageImage};
use crate::pipeline::encode::to_attachment;
use crate::pipeline::service::{ChatRequest, ChatTurn, GenerativeService, ServiceReply};
use crate::prompts::{render_template, PromptParams};
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Produces a [`GroupSummary`] for each group.
///
/// One enricher is shared by every group of a run; its semaphore holds
/// `config.concurrency` permits and every service call takes one, so that is
/// the ceiling on requests in flight however groups and images nest.
pub struct Enricher<'a> {
    service: &'a dyn GenerativeService,
    config: &'a ConversionConfig,
    language: Option<&'a str>,
    permits: Semaphore,
}

impl<'a> Enricher<'a> {
    /// `language` is what `{language}` resolves to; `None` means the
    /// original language of the document.
    pub fn new(
        service: &'a dyn GenerativeService,
        config: &'a ConversionConfig,
        language: Option<&'a str>,
    ) -> Self {
        Self {
            service,
            config,
            language,
            permits: Semaphore::new(config.concurrency.max(1)),
        }
    }

    /// Send `request` once a call permit is free.
    async fn call(&self, request: &ChatRequest) -> ServiceReply {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ServiceError::Api {
                detail: format!("call limiter closed: {e}"),
            })?;
        self.service.complete(request).await
    }

    /// Request for the slide title of `text`.
    pub fn title_request(&self, text: &str) -> ChatRequest {
        let prompt = render_template(
            &self.config.prompts.title,
            PromptParams::new(self.config.settings.max_words_title, self.language),
        );
        ChatRequest {
            model: self.config.model_id().to_string(),
            messages: vec![ChatTurn::system(prompt), ChatTurn::user(text)],
            max_tokens: self.config.title_max_tokens,
        }
    }

    /// Request for the bullet summary of `text`.
    pub fn summary_request(&self, text: &str) -> ChatRequest {
        let prompt = render_template(
            &self.config.prompts.summarize,
            PromptParams::new(self.config.settings.max_words_per_bullet, self.language),
        );
        ChatRequest {
            model: self.config.model_id().to_string(),
            messages: vec![ChatTurn::system(prompt), ChatTurn::user(text)],
            max_tokens: self.config.summary_max_tokens,
        }
    }

    /// Multimodal request rating how well `image` supports `text`.
    pub fn score_request(&self, text: &str, image: &PageImage) -> ChatRequest {
        ChatRequest {
            model: self.config.model_id().to_string(),
            messages: vec![
                ChatTurn::system(self.config.prompts.image_eval.clone()),
                ChatTurn::user_with_image(text, to_attachment(image)),
            ],
            max_tokens: self.config.score_max_tokens,
        }
    }

    /// Run the title, summary and scoring calls for `group`.
    ///
    /// The three kinds of calls run concurrently; image scores come back in
    /// image order regardless of completion order.
    pub async fn enrich(&self, group: &Group) -> GroupSummary {
        let text = group.combined_text.as_str();
        let max_words = self.config.settings.max_words_per_bullet;

        let title_request = self.title_request(text);
        let summary_request = self.summary_request(text);

        let scores = stream::iter(group.images())
            .map(|image| {
                let request = self.score_request(text, image);
                async move { self.call(&request).await }
            })
            .buffered(self.config.concurrency.max(1))
            .collect::<Vec<ServiceReply>>();

        let (title_reply, summary_reply, score_replies) = tokio::join!(
            self.call(&title_request),
            self.call(&summary_request),
            scores,
        );

        let mut failed_calls = 0;
        if let Err(e) = &title_reply {
            warn!("Group {}: title call failed: {}", group.index + 1, e);
            failed_calls += 1;
        }
        if let Err(e) = &summary_reply {
            warn!("Group {}: summary call failed: {}", group.index + 1, e);
            failed_calls += 1;
        }

        let scores: Vec<f32> = score_replies
            .into_iter()
            .enumerate()
            .map(|(i, reply)| {
                match &reply {
                    Err(e) => {
                        warn!("Group {}: image {} scoring failed: {}", group.index + 1, i + 1, e);
                        failed_calls += 1;
                    }
                    Ok(raw) if parse_score(raw).is_none() => {
                        warn!(
                            "Group {}: image {} score not numeric: {:?}",
                            group.index + 1,
                            i + 1,
                            raw
                        );
                        failed_calls += 1;
                    }
                    Ok(_) => {}
                }
                score_from_reply(reply)
            })
            .collect();

        let summary = GroupSummary {
            title: title_from_reply(title_reply),
            bullets: bullets_from_reply(summary_reply, max_words),
            scores,
            failed_calls,
        };

        debug!(
            "Group {}: title {:?}, {} bullets, scores {:?}",
            group.index + 1,
            summary.title,
            summary.bullets.len(),
            summary.scores
        );

        summary
    }
}

// ── Degrade-to-default mappings ──────────────────────────────────────────

/// Title reply → title; failure → `""`.
pub fn title_from_reply(reply: ServiceReply) -> String {
    reply.map(|content| clean_title(&content)).unwrap_or_default()
}

/// Summary reply → bullets truncated to `max_words`; failure → `[]`.
pub fn bullets_from_reply(reply: ServiceReply, max_words: usize) -> Vec<String> {
    reply
        .map(|content| parse_bullets(&content, max_words))
        .unwrap_or_default()
}

/// Score reply → score; failure or non-numeric reply → `0.0`.
pub fn score_from_reply(reply: ServiceReply) -> f32 {
    reply
        .ok()
        .and_then(|content| parse_score(&content))
        .unwrap_or(0.0)
}

// ── Reply parsing ────────────────────────────────────────────────────────

/// Trim, then strip surrounding double quotes.
pub fn clean_title(content: &str) -> String {
    content.trim().trim_matches('"').trim().to_string()
}

/// One bullet per non-empty line, leading `-`/space markers removed, each
/// truncated to `max_words` words. A line holding only markers or blanks
/// still yields an (empty) bullet.
pub fn parse_bullets(content: &str, max_words: usize) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_start_matches(['-', ' ']).trim())
        .map(|line| truncate_words(line, max_words))
        .collect()
}

/// Keep at most `max_words` whitespace-separated words, joined by single
/// spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a bare numeric reply. Non-finite values are rejected.
pub fn parse_score(content: &str) -> Option<f32> {
    content
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|score| score.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::output::Page;
    use crate::pipeline::service::ChatContent;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn failed() -> ServiceReply {
        Err(ServiceError::Api {
            detail: "boom".into(),
        })
    }

    #[test]
    fn title_is_trimmed_and_unquoted() {
        assert_eq!(title_from_reply(Ok("  \"Quarterly Results\" \n".into())), "Quarterly Results");
        assert_eq!(title_from_reply(Ok("Plain".into())), "Plain");
        assert_eq!(title_from_reply(failed()), "");
    }

    #[test]
    fn bullets_strip_markers_and_skip_empty_lines() {
        let reply = "- First point\n\n-  Second point  \nThird without marker\n--- dashes";
        assert_eq!(
            bullets_from_reply(Ok(reply.into()), 10),
            vec!["First point", "Second point", "Third without marker", "dashes"]
        );
    }

    #[test]
    fn bullets_keep_blank_and_marker_only_lines() {
        let bullets = bullets_from_reply(Ok("- a\n   \n-\n- b".into()), 10);
        assert_eq!(bullets, vec!["a", "", "", "b"]);
    }

    #[test]
    fn bullets_truncated_on_word_boundary() {
        let reply = "- one two three four five six";
        let bullets = bullets_from_reply(Ok(reply.into()), 4);
        assert_eq!(bullets, vec!["one two three four"]);
        assert!(bullets.iter().all(|b| b.split_whitespace().count() <= 4));
    }

    #[test]
    fn bullets_failure_is_empty() {
        assert!(bullets_from_reply(failed(), 10).is_empty());
        assert!(bullets_from_reply(Ok(String::new()), 10).is_empty());
    }

    #[test]
    fn score_parsing() {
        assert_eq!(score_from_reply(Ok(" 7.5\n".into())), 7.5);
        assert_eq!(score_from_reply(Ok("9".into())), 9.0);
        assert_eq!(score_from_reply(Ok("Score: 9".into())), 0.0);
        assert_eq!(score_from_reply(Ok("NaN".into())), 0.0);
        assert_eq!(score_from_reply(Ok(String::new())), 0.0);
        assert_eq!(score_from_reply(failed()), 0.0);
    }

    /// Answers by the system prompt it sees and records every request.
    struct Scripted {
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl GenerativeService for Scripted {
        async fn complete(&self, request: &ChatRequest) -> ServiceReply {
            self.requests.lock().unwrap().push(request.clone());
            let system = request.system_prompt().unwrap_or_default();
            if request.has_image() {
                let ChatContent::TextWithImage { image, .. } = &request.messages[1].content else {
                    unreachable!()
                };
                // Second image fails, the others score by their payload length.
                if image.data_b64 == "Ag==" {
                    return Err(ServiceError::Timeout { secs: 1 });
                }
                Ok(format!("{}", image.data_b64.len()))
            } else if system.starts_with("TITLE") {
                Ok("\"Intro\"".into())
            } else {
                Ok("- a b c\n- d".into())
            }
        }
    }

    fn config() -> ConversionConfig {
        let mut config = ConversionConfig::default();
        config.prompts.title = "TITLE {max_words}".into();
        config.prompts.summarize = "SUMMARY {max_words} in {language}".into();
        config.settings.max_words_per_bullet = 2;
        config
    }

    fn group() -> Group {
        Group {
            index: 0,
            pages: vec![Page {
                number: 1,
                text: "hello".into(),
                images: vec![
                    PageImage::new(vec![1], "png"),
                    PageImage::new(vec![2], "png"),
                    PageImage::new(vec![3, 3, 3, 3], "jpeg"),
                ],
            }],
            combined_text: "hello".into(),
        }
    }

    #[tokio::test]
    async fn enrich_builds_prompts_and_maps_replies() {
        let service = Scripted {
            requests: Mutex::new(Vec::new()),
        };
        let config = config();
        let enricher = Enricher::new(&service, &config, Some("de"));

        let summary = enricher.enrich(&group()).await;

        assert_eq!(summary.title, "Intro");
        assert_eq!(summary.bullets, vec!["a b", "d"]);
        assert_eq!(summary.scores, vec![4.0, 0.0, 8.0]);
        assert_eq!(summary.failed_calls, 1);

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 5);
        let prompts: Vec<&str> = requests.iter().filter_map(|r| r.system_prompt()).collect();
        assert!(prompts.contains(&"TITLE 4\nRespond in de."));
        assert!(prompts.contains(&"SUMMARY 2 in de"));
        let title = requests.iter().find(|r| r.max_tokens == 16).unwrap();
        assert_eq!(title.messages[1].content.text(), "hello");
        assert_eq!(title.model, "gpt-4.1-nano");
    }

    #[test]
    fn score_request_carries_image_and_text() {
        let service = Scripted {
            requests: Mutex::new(Vec::new()),
        };
        let config = ConversionConfig::default();
        let enricher = Enricher::new(&service, &config, None);
        let req = enricher.score_request("caption", &PageImage::new(vec![0xff], "jpg"));
        assert_eq!(req.max_tokens, 8);
        assert_eq!(req.system_prompt(), Some(config.prompts.image_eval.as_str()));
        match &req.messages[1].content {
            ChatContent::TextWithImage { text, image } => {
                assert_eq!(text, "caption");
                assert_eq!(image.mime_type, "image/jpeg");
            }
            other => panic!("expected multimodal content, got {other:?}"),
        }
    }

    #[test]
    fn no_language_uses_original_language_phrase() {
        let service = Scripted {
            requests: Mutex::new(Vec::new()),
        };
        let config = config();
        let enricher = Enricher::new(&service, &config, None);
        let req = enricher.summary_request("x");
        assert_eq!(req.system_prompt(), Some("SUMMARY 2 in the original language"));
        assert_eq!(req.max_tokens, 256);
    }
}
