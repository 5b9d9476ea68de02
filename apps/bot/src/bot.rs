//! The bot: both pipelines behind one lock, plus the chat channel.
//!
//! Every trigger (timer, HTTP, test flag) goes through `send_inspiration` or
//! `send_dinner`. The pipeline lock is held while generating and committing and
//! released before delivery, so at most one pipeline touches the stores at a time.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::ideas::generator::{IdeaGenerator, IdeaOutcome};
use crate::meals::recommender::{MealOutcome, MealRecommender};
use crate::notifier::DeliveryChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Idea,
    Meal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    Delivered,
    /// The channel refused the message.
    Failed,
    /// Shutdown was requested before anything was sent.
    Cancelled,
}

pub struct Pipelines {
    pub ideas: IdeaGenerator,
    pub meals: MealRecommender,
}

pub struct InspirationBot {
    pipelines: Mutex<Pipelines>,
    channel: Arc<dyn DeliveryChannel>,
    cancel: CancellationToken,
}

impl InspirationBot {
    pub fn new(
        pipelines: Pipelines,
        channel: Arc<dyn DeliveryChannel>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pipelines: Mutex::new(pipelines),
            channel,
            cancel,
        }
    }

    /// Generates the next idea and delivers whatever the run produced.
    pub async fn send_inspiration(&self) -> SendResult {
        if self.cancel.is_cancelled() {
            return SendResult::Cancelled;
        }

        let mut pipelines = self.pipelines.lock().await;
        let kind = pipelines.ideas.next_kind();
        info!("Generating {kind} idea");
        let outcome = pipelines.ideas.generate_idea(kind, &self.cancel).await;
        drop(pipelines);

        match &outcome {
            IdeaOutcome::Accepted {
                title, attempts, ..
            } => info!("Sending '{title}' (attempt {attempts})"),
            IdeaOutcome::Exhausted { attempts, rejected } => warn!(
                "Sending no-idea notice after {attempts} attempts, last rejection: {}",
                rejected.last().map(String::as_str).unwrap_or("-")
            ),
            IdeaOutcome::Failed { .. } => warn!("Sending failure diagnostic"),
            IdeaOutcome::Cancelled => {}
        }

        match outcome.message() {
            Some(message) => self.deliver(JobKind::Idea, &message).await,
            None => SendResult::Cancelled,
        }
    }

    /// Generates tonight's menu and delivers it.
    pub async fn send_dinner(&self) -> SendResult {
        if self.cancel.is_cancelled() {
            return SendResult::Cancelled;
        }

        let mut pipelines = self.pipelines.lock().await;
        info!("Generating dinner menu");
        let outcome = pipelines.meals.generate_dinner_menu().await;
        drop(pipelines);

        if let MealOutcome::Menu { dishes, .. } = &outcome {
            info!("Sending menu with {} dishes", dishes.len());
        }
        self.deliver(JobKind::Meal, outcome.message()).await
    }

    pub async fn announce(&self, text: &str) -> bool {
        self.channel.deliver(text).await
    }

    async fn deliver(&self, kind: JobKind, message: &str) -> SendResult {
        if self.channel.deliver(message).await {
            info!("{kind:?} delivered");
            SendResult::Delivered
        } else {
            error!("{kind:?} delivery failed");
            SendResult::Failed
        }
    }
}

/// Chat notice sent once the schedules are running.
pub fn startup_message(
    interval_minutes: u64,
    meal_at: NaiveTime,
    started: DateTime<FixedOffset>,
) -> String {
    format!(
        "🚀 *영감봇 시작!*\n\n\
         💡 소프트웨어 아이디어: {interval_minutes}분마다\n\
         🍽️ 토양체질 저녁 식단: 매일 {}\n\n\
         📅 시작 시각: {}",
        meal_at.format("%H:%M"),
        started.format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;
    use crate::ideas::generator::exhausted_message;
    use crate::testing::{idea_text, test_bot, RecordingChannel, ScriptedLlm};

    #[tokio::test]
    async fn test_idea_is_delivered() {
        let dir = TempDir::new().unwrap();
        let text = idea_text("앱A", "설명");
        let llm = Arc::new(ScriptedLlm::new().draft(Ok(text.clone())));
        let channel = Arc::new(RecordingChannel::accepting());
        let bot = test_bot(&dir, llm, channel.clone(), CancellationToken::new());

        assert_eq!(bot.send_inspiration().await, SendResult::Delivered);
        assert_eq!(channel.sent(), vec![text]);
    }

    #[tokio::test]
    async fn test_channel_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new().always_draft("*1️⃣ [굴국밥]*"));
        let channel = Arc::new(RecordingChannel::rejecting());
        let bot = test_bot(&dir, llm, channel.clone(), CancellationToken::new());

        assert_eq!(bot.send_dinner().await, SendResult::Failed);
        assert_eq!(channel.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_triggers_are_serialized() {
        let dir = TempDir::new().unwrap();
        let text = idea_text("같은 아이디어", "설명");
        let llm = Arc::new(ScriptedLlm::new().always_draft(&text));
        let channel = Arc::new(RecordingChannel::accepting());
        let bot = test_bot(&dir, llm, channel.clone(), CancellationToken::new());

        let (a, b) = tokio::join!(bot.send_inspiration(), bot.send_inspiration());

        assert_eq!((a, b), (SendResult::Delivered, SendResult::Delivered));
        // the second run saw the first run's commit and rejected the repeat
        let mut sent = channel.sent();
        sent.sort();
        let mut expected = vec![text, exhausted_message(4)];
        expected.sort();
        assert_eq!(sent, expected);
    }

    #[tokio::test]
    async fn test_nothing_sent_after_shutdown() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new().always_draft(&idea_text("앱", "x")));
        let channel = Arc::new(RecordingChannel::accepting());
        let cancel = CancellationToken::new();
        let bot = test_bot(&dir, llm.clone(), channel.clone(), cancel.clone());
        cancel.cancel();

        assert_eq!(bot.send_inspiration().await, SendResult::Cancelled);
        assert_eq!(bot.send_dinner().await, SendResult::Cancelled);
        assert!(channel.sent().is_empty());
        assert!(llm.calls().is_empty());
    }

    #[test]
    fn test_startup_message() {
        let started = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 1, 9, 5, 0)
            .unwrap();
        let message = startup_message(240, NaiveTime::from_hms_opt(17, 30, 0).unwrap(), started);
        assert!(message.contains("240분마다"));
        assert!(message.contains("매일 17:30"));
        assert!(message.contains("2025-03-01 09:05:00"));
    }
}
