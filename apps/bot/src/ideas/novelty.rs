//! Novelty adjudication: asks a search-grounded model whether a candidate idea
//! duplicates prior art or something already sent.
//!
//! Fails open: if the judge call errors or answers with something that is not
//! a verdict, the candidate is treated as novel so the pipeline keeps moving.

use std::sync::Arc;

use tracing::{info, warn};

use crate::ideas::prompts::NOVELTY_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{CompletionOptions, CompletionService};
use crate::models::idea::NoveltyVerdict;

/// Similar examples kept from a verdict.
pub const MAX_SIMILAR_EXAMPLES: usize = 5;

pub struct NoveltyAdjudicator {
    llm: Arc<dyn CompletionService>,
}

impl NoveltyAdjudicator {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    pub async fn validate(
        &self,
        idea_text: &str,
        title: &str,
        summary_context: &str,
    ) -> NoveltyVerdict {
        let context = if summary_context.is_empty() {
            "(없음)"
        } else {
            summary_context
        };
        let prompt = fill_template(
            NOVELTY_PROMPT_TEMPLATE,
            &[
                ("title", title),
                ("idea_text", idea_text),
                ("summary_context", context),
                ("json_only", JSON_ONLY_INSTRUCTION),
            ],
        );

        let raw = match self
            .llm
            .complete(&prompt, &CompletionOptions::grounded())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Novelty check unavailable for '{title}', failing open: {e}");
                return fail_open(format!("novelty check unavailable ({e}); fallback to novel"));
            }
        };

        match parse_verdict(&raw) {
            Some(verdict) => {
                info!(
                    "Novelty verdict for '{}': is_novel={} ({})",
                    title, verdict.is_novel, verdict.reason
                );
                verdict
            }
            None => {
                warn!(
                    "Novelty verdict for '{title}' was not valid JSON, failing open: {:?}",
                    raw.chars().take(120).collect::<String>()
                );
                fail_open("novelty verdict unparsable; fallback to novel".to_string())
            }
        }
    }
}

fn fail_open(reason: String) -> NoveltyVerdict {
    NoveltyVerdict {
        is_novel: true,
        reason,
        similar_examples: Vec::new(),
    }
}

/// Parses the first JSON object in `raw` as a verdict.
pub fn parse_verdict(raw: &str) -> Option<NoveltyVerdict> {
    let json = first_json_object(raw)?;
    let mut verdict: NoveltyVerdict = serde_json::from_str(json).ok()?;
    verdict.similar_examples.truncate(MAX_SIMILAR_EXAMPLES);
    Some(verdict)
}

/// The first balanced `{...}` span in `text`, ignoring braces inside JSON strings.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::testing::ScriptedLlm;

    #[test]
    fn test_first_json_object_skips_prose_and_fences() {
        let raw = "판단 결과입니다:\n```json\n{\"is_novel\": false, \"reason\": \"x\"}\n```\n끝";
        assert_eq!(
            first_json_object(raw),
            Some("{\"is_novel\": false, \"reason\": \"x\"}")
        );
    }

    #[test]
    fn test_first_json_object_handles_nesting_and_string_braces() {
        let raw = r#"pre {"a": {"b": "}{"}, "c": "\"}"} post {"d": 1}"#;
        assert_eq!(
            first_json_object(raw),
            Some(r#"{"a": {"b": "}{"}, "c": "\"}"}"#)
        );
    }

    #[test]
    fn test_first_json_object_unbalanced() {
        assert!(first_json_object("{\"is_novel\": true").is_none());
        assert!(first_json_object("no json here").is_none());
    }

    #[test]
    fn test_parse_verdict_truncates_examples() {
        let raw = r#"{"is_novel": false, "reason": "흔함", "similar_examples": ["1","2","3","4","5","6","7"]}"#;
        let verdict = parse_verdict(raw).unwrap();
        assert!(!verdict.is_novel);
        assert_eq!(verdict.similar_examples.len(), MAX_SIMILAR_EXAMPLES);
    }

    #[test]
    fn test_parse_verdict_rejects_wrong_shape() {
        assert!(parse_verdict(r#"{"novel": "yes"}"#).is_none());
    }

    #[tokio::test]
    async fn test_validate_uses_grounded_call() {
        let llm = Arc::new(
            ScriptedLlm::new().verdict(Ok(r#"{"is_novel": true, "reason": "새로움"}"#.into())),
        );
        let adjudicator = NoveltyAdjudicator::new(llm.clone());

        let verdict = adjudicator.validate("idea", "제목", "").await;

        assert!(verdict.is_novel);
        assert_eq!(verdict.reason, "새로움");
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.grounding);
        assert!(calls[0].0.contains("제목"));
        assert!(calls[0].0.contains("(없음)"));
    }

    #[tokio::test]
    async fn test_validate_fails_open_on_timeout() {
        let llm = Arc::new(ScriptedLlm::new().verdict(Err(LlmError::Api {
            status: 504,
            message: "deadline exceeded".to_string(),
        })));
        let verdict = NoveltyAdjudicator::new(llm).validate("idea", "t", "ctx").await;
        assert!(verdict.is_novel);
        assert!(verdict.reason.contains("fallback"));
    }

    #[tokio::test]
    async fn test_validate_fails_open_on_garbage() {
        let llm = Arc::new(ScriptedLlm::new().verdict(Ok("글쎄요, 잘 모르겠네요.".into())));
        let verdict = NoveltyAdjudicator::new(llm).validate("idea", "t", "ctx").await;
        assert!(verdict.is_novel);
        assert!(verdict.reason.contains("fallback"));
    }

    #[tokio::test]
    async fn test_validate_passes_through_rejection() {
        let llm = Arc::new(ScriptedLlm::new().verdict(Ok(
            r#"이미 있음 {"is_novel": false, "reason": "Too Good To Go와 같음", "similar_examples": ["Too Good To Go"]}"#.into(),
        )));
        let verdict = NoveltyAdjudicator::new(llm).validate("idea", "t", "ctx").await;
        assert!(!verdict.is_novel);
        assert_eq!(verdict.similar_examples, vec!["Too Good To Go"]);
    }

    #[tokio::test]
    async fn test_placeholders_inside_idea_stay_literal() {
        let llm = Arc::new(ScriptedLlm::new());
        let adjudicator = NoveltyAdjudicator::new(llm.clone());

        adjudicator
            .validate(
                "idea body mentions {summary_context} and {json_only} literally",
                "t",
                "- 2025-03-01 | software | 앱A | 요약",
            )
            .await;

        let prompt = &llm.calls()[0].0;
        assert_eq!(prompt.matches("앱A").count(), 1);
        assert!(prompt.contains("mentions {summary_context} and {json_only} literally"));
        assert_eq!(prompt.matches(JSON_ONLY_INSTRUCTION).count(), 1);
    }
}
