//! Scripted collaborators for pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::FixedOffset;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::bot::{InspirationBot, Pipelines};
use crate::config::GenerationConfig;
use crate::ideas::generator::IdeaGenerator;
use crate::llm_client::{CompletionOptions, CompletionService, LlmError};
use crate::meals::diet::ToyangDiet;
use crate::meals::recommender::MealRecommender;
use crate::notifier::DeliveryChannel;
use crate::store::history::{HistoryStore, HISTORY_FILE};
use crate::store::meals::{MealHistory, MEAL_HISTORY_FILE};
use crate::store::summary::{SummaryStore, SUMMARY_FILE};

/// Completion service that replays queued answers.
///
/// Grounded calls (novelty checks) pop from the verdict queue; everything else
/// pops from the draft queue. Empty queues fall back to the defaults.
pub struct ScriptedLlm {
    drafts: Mutex<VecDeque<Result<String, LlmError>>>,
    verdicts: Mutex<VecDeque<Result<String, LlmError>>>,
    default_draft: Option<String>,
    default_verdict: String,
    models: Vec<String>,
    calls: Mutex<Vec<(String, CompletionOptions)>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            drafts: Mutex::new(VecDeque::new()),
            verdicts: Mutex::new(VecDeque::new()),
            default_draft: None,
            default_verdict: r#"{"is_novel": true, "reason": "scripted"}"#.to_string(),
            models: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn draft(self, answer: Result<String, LlmError>) -> Self {
        self.drafts.lock().unwrap().push_back(answer);
        self
    }

    pub fn verdict(self, answer: Result<String, LlmError>) -> Self {
        self.verdicts.lock().unwrap().push_back(answer);
        self
    }

    pub fn always_draft(mut self, text: &str) -> Self {
        self.default_draft = Some(text.to_string());
        self
    }

    pub fn models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<(String, CompletionOptions)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn draft_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, options)| !options.grounding)
            .map(|(prompt, _)| prompt)
            .collect()
    }

    pub fn verdict_calls(&self) -> usize {
        self.calls().iter().filter(|(_, o)| o.grounding).count()
    }
}

#[async_trait]
impl CompletionService for ScriptedLlm {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), options.clone()));

        if options.grounding {
            let next = self.verdicts.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.default_verdict.clone()))
        } else {
            let next = self.drafts.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.default_draft.clone().ok_or(LlmError::EmptyContent))
        }
    }

    async fn list_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn model(&self) -> &str {
        "gemini-test"
    }
}

/// Delivery channel that records every message it is handed.
pub struct RecordingChannel {
    accept: bool,
    sent: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn deliver(&self, text: &str) -> bool {
        self.sent.lock().unwrap().push(text.to_string());
        self.accept
    }
}

/// Well-formed idea answer titled `title`.
pub fn idea_text(title: &str, one_liner: &str) -> String {
    format!(
        "영감봇\n**프로젝트 이름:** \"{title}\"\n\n**한 줄 설명:** {one_liner}\n\n\
         **왜 이걸 만들어?** 귀찮아서\n\n**어떻게 작동해?** 알아서 잘 작동한다.\n\n\
         **기술 스택:**\n- Rust (백엔드)\n\n**예상 개발 시간:** 8시간"
    )
}

/// Bot wired to scripted collaborators with its stores under `dir`.
pub fn test_bot(
    dir: &TempDir,
    llm: Arc<ScriptedLlm>,
    channel: Arc<RecordingChannel>,
    cancel: CancellationToken,
) -> InspirationBot {
    let offset = FixedOffset::east_opt(9 * 3600).unwrap();
    let pipelines = Pipelines {
        ideas: IdeaGenerator::new(
            llm.clone(),
            HistoryStore::load(dir.path().join(HISTORY_FILE)),
            SummaryStore::open(dir.path().join(SUMMARY_FILE), offset),
            &GenerationConfig::default(),
        ),
        meals: MealRecommender::new(
            llm,
            ToyangDiet,
            MealHistory::load(dir.path().join(MEAL_HISTORY_FILE), offset),
        ),
    };
    InspirationBot::new(pipelines, channel, cancel)
}
