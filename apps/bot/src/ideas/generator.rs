//! Idea generation: orchestrates draft → local duplicate check → novelty check → commit.
//!
//! Flow per call: build the category prompt with exclusion context, then loop
//! up to `max_attempts` times. A rejected draft feeds its reason back into the
//! next prompt. Only an accepted idea touches the stores, history first and
//! summary second.
//!
//! A drafting call that errors aborts the whole run with a user-facing
//! diagnostic; it does not consume a retry.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::ideas::extract::{extract_summary, extract_title};
use crate::ideas::novelty::NoveltyAdjudicator;
use crate::ideas::prompts::{exclusion_block, pick_audience, rejection_block, template_for};
use crate::ideas::similarity::SimilarityFilter;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{pick_best_model, CompletionOptions, CompletionService, LlmError};
use crate::models::idea::IdeaKind;
use crate::store::history::HistoryStore;
use crate::store::summary::SummaryStore;

/// Recent titles listed in the drafting prompt.
const PROMPT_RECENT_TITLES: usize = 20;
/// Summary lines listed in the drafting prompt.
const PROMPT_SUMMARY_LINES: usize = 80;
/// Recent history titles in the local duplicate pool (all summary titles are added too).
const POOL_RECENT_TITLES: usize = 120;
const DRAFT_TEMPERATURE: f32 = 1.0;

// ────────────────────────────────────────────────────────────────────────────
// Outcomes
// ────────────────────────────────────────────────────────────────────────────

/// Why a draft was turned down.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TitleMissing,
    LocalDuplicate {
        title: String,
        existing: String,
        ratio: f64,
    },
    RemoteDuplicate {
        title: String,
        reason: String,
        similar_examples: Vec<String>,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TitleMissing => write!(
                f,
                "title extraction failed: '**프로젝트 이름:**' 형식을 정확히 지켜주세요"
            ),
            Rejection::LocalDuplicate {
                title,
                existing,
                ratio,
            } => write!(
                f,
                "'{title}'은(는) 이미 보낸 '{existing}'와(과) 너무 비슷함 (유사도 {ratio:.2})"
            ),
            Rejection::RemoteDuplicate {
                title,
                reason,
                similar_examples,
            } => {
                write!(f, "'{title}' 중복 판정: {reason}")?;
                if !similar_examples.is_empty() {
                    write!(f, " (비슷한 사례: {})", similar_examples.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// State carried from one attempt to the next within a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationAttempt {
    pub number: u32,
    pub rejected_reasons: Vec<String>,
}

impl GenerationAttempt {
    fn first() -> Self {
        Self {
            number: 1,
            rejected_reasons: Vec::new(),
        }
    }

    fn next(self, rejection: &Rejection) -> Self {
        let mut rejected_reasons = self.rejected_reasons;
        rejected_reasons.push(rejection.to_string());
        Self {
            number: self.number + 1,
            rejected_reasons,
        }
    }
}

/// Terminal result of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub enum IdeaOutcome {
    Accepted {
        title: String,
        text: String,
        attempts: u32,
    },
    /// Every attempt was rejected. A normal outcome, not an error.
    Exhausted {
        attempts: u32,
        rejected: Vec<String>,
    },
    /// The drafting call failed; `message` is ready to send.
    Failed { message: String },
    /// Shutdown was requested between attempts. Nothing was committed.
    Cancelled,
}

impl IdeaOutcome {
    /// Text for the chat channel. `None` only when cancelled.
    pub fn message(&self) -> Option<String> {
        match self {
            IdeaOutcome::Accepted { text, .. } => Some(text.clone()),
            IdeaOutcome::Exhausted { attempts, .. } => Some(exhausted_message(*attempts)),
            IdeaOutcome::Failed { message } => Some(message.clone()),
            IdeaOutcome::Cancelled => None,
        }
    }
}

pub fn exhausted_message(attempts: u32) -> String {
    format!(
        "😅 오늘은 새로운 아이디어를 찾지 못했어요.\n\n\
         {attempts}번 시도했지만 모두 이전에 보낸 아이디어나 이미 있는 서비스와 겹쳤습니다.\n\
         다음 시간에 더 신박한 아이디어로 찾아올게요!"
    )
}

enum Step {
    Accepted { title: String, text: String },
    Rejected(Rejection),
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

pub struct IdeaGenerator {
    llm: Arc<dyn CompletionService>,
    adjudicator: NoveltyAdjudicator,
    history: HistoryStore,
    summaries: SummaryStore,
    filter: SimilarityFilter,
    max_attempts: u32,
}

impl IdeaGenerator {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        history: HistoryStore,
        summaries: SummaryStore,
        config: &GenerationConfig,
    ) -> Self {
        let filter = SimilarityFilter::new(config.similarity_threshold);
        info!(
            "Idea generator ready: {} ideas in history (last type: {}), similarity threshold {}, max {} attempts",
            history.state().history.len(),
            history.state().last_type,
            filter.threshold(),
            config.max_attempts
        );

        Self {
            adjudicator: NoveltyAdjudicator::new(llm.clone()),
            llm,
            history,
            summaries,
            filter,
            max_attempts: config.max_attempts,
        }
    }

    /// Category the history policy wants next.
    pub fn next_kind(&self) -> IdeaKind {
        self.history.next_kind()
    }

    #[cfg(test)]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    #[cfg(test)]
    pub fn summaries(&self) -> &SummaryStore {
        &self.summaries
    }

    /// Runs the bounded draft/check loop for `kind` and commits an accepted idea.
    pub async fn generate_idea(&mut self, kind: IdeaKind, cancel: &CancellationToken) -> IdeaOutcome {
        let span = info_span!("idea_run", run_id = %Uuid::new_v4(), kind = %kind);
        self.run(kind, cancel).instrument(span).await
    }

    async fn run(&mut self, kind: IdeaKind, cancel: &CancellationToken) -> IdeaOutcome {
        let base_prompt = self.base_prompt(kind);
        let mut attempt = GenerationAttempt::first();

        loop {
            if cancel.is_cancelled() {
                info!("Shutdown requested, abandoning idea run before attempt {}", attempt.number);
                return IdeaOutcome::Cancelled;
            }

            info!("Attempt {}/{}", attempt.number, self.max_attempts);
            let step = match self.attempt(&base_prompt, &attempt).await {
                Ok(step) => step,
                Err(e) => {
                    error!("Idea drafting failed: {e}");
                    return IdeaOutcome::Failed {
                        message: self.diagnostic(&e).await,
                    };
                }
            };

            match step {
                Step::Accepted { title, text } => {
                    self.commit(&title, kind, &text);
                    info!("Accepted '{}' after {} attempt(s)", title, attempt.number);
                    return IdeaOutcome::Accepted {
                        title,
                        text,
                        attempts: attempt.number,
                    };
                }
                Step::Rejected(rejection) => {
                    warn!("Attempt {} rejected: {}", attempt.number, rejection);
                    if attempt.number >= self.max_attempts {
                        let attempts = attempt.number;
                        let rejected = attempt.next(&rejection).rejected_reasons;
                        warn!("No novel idea after {attempts} attempts");
                        return IdeaOutcome::Exhausted { attempts, rejected };
                    }
                    attempt = attempt.next(&rejection);
                }
            }
        }
    }

    fn base_prompt(&self, kind: IdeaKind) -> String {
        let recent = self.history.recent_titles(PROMPT_RECENT_TITLES);
        let context = self.summaries.recent_context(PROMPT_SUMMARY_LINES);
        let exclusions = exclusion_block(&recent, &context);
        fill_template(
            template_for(kind),
            &[("audience", pick_audience(kind)), ("exclusions", exclusions.as_str())],
        )
    }

    /// Draft, local check, remote check. Errors only when drafting fails.
    async fn attempt(&self, base_prompt: &str, attempt: &GenerationAttempt) -> Result<Step, LlmError> {
        // Drafting
        let prompt = format!("{base_prompt}{}", rejection_block(&attempt.rejected_reasons));
        let options = CompletionOptions {
            temperature: Some(DRAFT_TEMPERATURE),
            grounding: false,
        };
        let text = self.llm.complete(&prompt, &options).await?;

        let Some(title) = extract_title(&text) else {
            return Ok(Step::Rejected(Rejection::TitleMissing));
        };

        // Local check
        let mut pool = self.history.recent_titles(POOL_RECENT_TITLES);
        pool.extend(self.summaries.all_titles());
        if let Some(hit) = self.filter.find_similar(&title, &pool) {
            return Ok(Step::Rejected(Rejection::LocalDuplicate {
                title,
                existing: hit.existing,
                ratio: hit.ratio,
            }));
        }

        // Remote check
        let context = self.summaries.recent_context(usize::MAX);
        let verdict = self.adjudicator.validate(&text, &title, &context).await;
        if !verdict.is_novel {
            return Ok(Step::Rejected(Rejection::RemoteDuplicate {
                title,
                reason: verdict.reason,
                similar_examples: verdict.similar_examples,
            }));
        }

        Ok(Step::Accepted { title, text })
    }

    fn commit(&mut self, title: &str, kind: IdeaKind, text: &str) {
        self.history.record_idea(title, kind);
        self.summaries.append_summary(title, kind, &extract_summary(text));
    }

    async fn diagnostic(&self, error: &LlmError) -> String {
        if !error.is_model_not_found() {
            return format!("⚠️ 아이디어 생성 중 오류가 발생했습니다: {error}");
        }

        let available = self.llm.list_models().await;
        let best = pick_best_model(&available, self.llm.model());
        format!(
            "⚠️ 아이디어 생성 중 오류가 발생했습니다!\n\n\
             에러: 404 NOT_FOUND\n\
             현재 모델 '{}'을(를) 찾을 수 없습니다.\n\n\
             🔄 사용 가능한 모델 '{best}'(으)로 변경해주세요!\n\n\
             📝 .env 파일 수정 필요:\n\
             GEMINI_MODEL={best}",
            self.llm.model()
        )
    }
}
