use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::state::{ResultsContent, Stage, StatePublisher};
use super::timing::{plan, Timing};
use crate::api::Backend;
use crate::error::ViewError;
use crate::logging::{log, log_stage, log_swallowed, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// Drives the reveal schedule against a view's publisher.
pub struct Sequencer {
    timing: Timing,
    backend: Arc<dyn Backend>,
}

impl Sequencer {
    pub fn new(timing: Timing, backend: Arc<dyn Backend>) -> Self {
        Self { timing, backend }
    }

    pub async fn run(
        &self,
        content: ResultsContent,
        publisher: &StatePublisher,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ViewError> {
        let steps = plan(&content.date, &content.nickname, content.cards.len(), &self.timing);
        let nickname = content.nickname.clone();
        let mut content = Some(content);

        for step in steps {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                _ = sleep(step.delay) => {}
            }

            match step.stage {
                Stage::DateTyping => {
                    let content = content.take();
                    publisher.apply(|s| {
                        s.content = content;
                        s.advance(Stage::DateTyping)
                    })?;
                }
                stage => publisher.advance(stage)?,
            }
            log_stage(&nickname, &step.stage.to_string(), publisher.current().visible_cards);

            if step.stage == Stage::SummaryRequested {
                self.request_summary(&nickname);
            }
        }
        Ok(Outcome::Completed)
    }

    /// Fire and forget. The visible flow never waits on it, and it is not
    /// tied to the view's lifetime because it changes no view state.
    fn request_summary(&self, nickname: &str) {
        let backend = Arc::clone(&self.backend);
        let nickname = nickname.to_string();
        tokio::spawn(async move {
            match backend.generate_summary(&nickname).await {
                Ok(()) => log(
                    Level::Info,
                    Domain::Fetch,
                    "summary_generated",
                    obj(&[("nickname", v_str(&nickname))]),
                ),
                Err(e) => log_swallowed(Domain::Fetch, "generate_summary", &nickname, &e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionScorecard;
    use crate::geo::Coordinates;
    use crate::api::RecommendationCategory;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct SummaryCounter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Backend for SummaryCounter {
        async fn submit_emotions(&self, _: &str, _: &EmotionScorecard) -> Result<()> {
            Ok(())
        }
        async fn submit_location(&self, _: &str, _: Coordinates) -> Result<()> {
            Ok(())
        }
        async fn recommend_for_user(&self, _: &str) -> Result<Vec<RecommendationCategory>> {
            Ok(Vec::new())
        }
        async fn generate_summary(&self, _: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("llm unavailable"))
        }
    }

    fn content(cards: usize) -> ResultsContent {
        ResultsContent {
            date: "2026-10-17".to_string(),
            nickname: "tester".to_string(),
            chart: Vec::new(),
            cards: (0..cards)
                .map(|i| crate::card::Card {
                    title: format!("card {}", i),
                    lines: Vec::new(),
                })
                .collect(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_button_and_requests_summary_once() {
        let backend = Arc::new(SummaryCounter::default());
        let sequencer = Sequencer::new(Timing::default(), backend.clone());
        let cancel = CancellationToken::new();
        let publisher = StatePublisher::new(cancel.clone());

        let started = tokio::time::Instant::now();
        let outcome = sequencer.run(content(3), &publisher, &cancel).await.unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert!(started.elapsed() >= Duration::from_millis(3940 + 300));

        let state = publisher.current();
        assert_eq!(state.stage, Stage::ButtonVisible);
        assert_eq!(state.visible_cards, 3);
        assert!(state.button_shown && state.summary_requested);
        assert_eq!(state.content.unwrap().cards.len(), 3);

        tokio::task::yield_now().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_publishing() {
        let backend = Arc::new(SummaryCounter::default());
        let sequencer = Sequencer::new(Timing::default(), backend.clone());
        let cancel = CancellationToken::new();
        let publisher = StatePublisher::new(cancel.clone());

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            canceller.cancel();
        });

        let outcome = sequencer.run(content(2), &publisher, &cancel).await.unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(publisher.stage(), Stage::UsernameLabelTyping);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(publisher.stage(), Stage::UsernameLabelTyping);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
