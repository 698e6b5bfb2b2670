//! Emotion scorecard, its radar-chart projection, and the check-screen submit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::api::Backend;
use crate::error::ViewError;
use crate::logging::{log, obj, v_str, Domain, Level};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
/// Upper bound of the radar chart's radial axis.
pub const CHART_MAX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Negative,
    Positive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionKey {
    Depression,
    Anxiety,
    Stress,
    Happiness,
    Energy,
    Achievement,
}

impl EmotionKey {
    pub const ALL: [EmotionKey; 6] = [
        EmotionKey::Depression,
        EmotionKey::Anxiety,
        EmotionKey::Stress,
        EmotionKey::Happiness,
        EmotionKey::Energy,
        EmotionKey::Achievement,
    ];

    /// Axis order on the radar chart.
    pub const RADAR_ORDER: [EmotionKey; 6] = [
        EmotionKey::Depression,
        EmotionKey::Anxiety,
        EmotionKey::Stress,
        EmotionKey::Happiness,
        EmotionKey::Achievement,
        EmotionKey::Energy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionKey::Depression => "depression",
            EmotionKey::Anxiety => "anxiety",
            EmotionKey::Stress => "stress",
            EmotionKey::Happiness => "happiness",
            EmotionKey::Energy => "energy",
            EmotionKey::Achievement => "achievement",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmotionKey::Depression => "우울",
            EmotionKey::Anxiety => "불안",
            EmotionKey::Stress => "스트레스",
            EmotionKey::Happiness => "행복",
            EmotionKey::Energy => "에너지",
            EmotionKey::Achievement => "성취감",
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            EmotionKey::Depression | EmotionKey::Anxiety | EmotionKey::Stress => Polarity::Negative,
            EmotionKey::Happiness | EmotionKey::Energy | EmotionKey::Achievement => {
                Polarity::Positive
            }
        }
    }
}

/// Self-reported scores in [1,5], keyed by emotion.
///
/// Immutable once handed to the results view; an empty card means the view
/// was opened without scores and the chart stays blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<EmotionKey, u8>", into = "BTreeMap<EmotionKey, u8>")]
pub struct EmotionScorecard {
    scores: BTreeMap<EmotionKey, u8>,
}

fn check_score(key: EmotionKey, score: u8) -> Result<u8, ViewError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(ViewError::validation(format!(
            "{} score {} outside [{}, {}]",
            key.as_str(),
            score,
            MIN_SCORE,
            MAX_SCORE
        )))
    }
}

impl EmotionScorecard {
    pub fn new(scores: impl IntoIterator<Item = (EmotionKey, u8)>) -> Result<Self, ViewError> {
        let mut card = Self::empty();
        for (key, score) in scores {
            card.set(key, score)?;
        }
        Ok(card)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Every key at the scale midpoint, the state the check screen opens with.
    pub fn neutral() -> Self {
        Self {
            scores: EmotionKey::ALL.iter().map(|k| (*k, 3)).collect(),
        }
    }

    /// Parses six comma-separated scores in `EmotionKey::ALL` order.
    pub fn parse_list(raw: &str) -> Result<Self, ViewError> {
        let values: Vec<&str> = raw.split(',').map(str::trim).collect();
        if values.len() != EmotionKey::ALL.len() {
            return Err(ViewError::validation(format!(
                "expected {} scores, got {}",
                EmotionKey::ALL.len(),
                values.len()
            )));
        }
        let mut card = Self::empty();
        for (key, value) in EmotionKey::ALL.iter().zip(values) {
            let score: u8 = value
                .parse()
                .map_err(|_| ViewError::validation(format!("bad score {:?} for {}", value, key.as_str())))?;
            card.set(*key, score)?;
        }
        Ok(card)
    }

    pub fn set(&mut self, key: EmotionKey, score: u8) -> Result<(), ViewError> {
        self.scores.insert(key, check_score(key, score)?);
        Ok(())
    }

    pub fn get(&self, key: EmotionKey) -> Option<u8> {
        self.scores.get(&key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        EmotionKey::ALL.iter().all(|k| self.scores.contains_key(k))
    }
}

impl TryFrom<BTreeMap<EmotionKey, u8>> for EmotionScorecard {
    type Error = ViewError;

    fn try_from(scores: BTreeMap<EmotionKey, u8>) -> Result<Self, Self::Error> {
        Self::new(scores)
    }
}

impl From<EmotionScorecard> for BTreeMap<EmotionKey, u8> {
    fn from(card: EmotionScorecard) -> Self {
        card.scores
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub key: EmotionKey,
    pub label: &'static str,
    pub value: f64,
}

/// Radar-chart data: nothing for an empty card, otherwise one point per axis.
pub fn chart_points(card: &EmotionScorecard) -> Vec<ChartPoint> {
    if card.is_empty() {
        return Vec::new();
    }
    EmotionKey::RADAR_ORDER
        .iter()
        .map(|key| ChartPoint {
            key: *key,
            label: key.label(),
            value: card
                .get(*key)
                .map(f64::from)
                .unwrap_or(0.0)
                .clamp(0.0, CHART_MAX),
        })
        .collect()
}

/// Marks a submit as running; the mark is cleared on drop, so a submit
/// cancelled mid-request does not block the next one.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Submits a finished scorecard. A second submit while one is in flight is
/// dropped rather than sent.
pub struct EmotionCheck {
    backend: Arc<dyn Backend>,
    in_flight: AtomicBool,
}

impl EmotionCheck {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns `Ok(false)` when the call was deduplicated.
    pub async fn submit(&self, nickname: &str, card: &EmotionScorecard) -> Result<bool> {
        if !card.is_complete() {
            return Err(anyhow!(ViewError::validation("scorecard is missing emotions")));
        }
        let Some(_guard) = InFlight::enter(&self.in_flight) else {
            return Ok(false);
        };
        let result = self.backend.submit_emotions(nickname, card).await;

        match result {
            Ok(()) => {
                log(
                    Level::Info,
                    Domain::Fetch,
                    "emotions_submitted",
                    obj(&[("nickname", v_str(nickname))]),
                );
                Ok(true)
            }
            Err(e) => Err(e.context("emotion check submit failed")),
        }
    }
}
