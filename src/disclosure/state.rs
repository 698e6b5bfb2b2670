use std::fmt;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::card::Card;
use crate::emotion::ChartPoint;
use crate::error::ViewError;

/// Position in the results-view choreography. Variants are declared in
/// reveal order, so `Ord` is "later than".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    DateTyping,
    UsernameLabelTyping,
    UsernameValueTyping,
    ChartVisible,
    /// 1-based index of the card being revealed.
    RevealingCard(usize),
    SummaryRequested,
    ButtonVisible,
    Stamped,
    Exiting,
    Navigated,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::DateTyping => "date_typing",
            Stage::UsernameLabelTyping => "username_label_typing",
            Stage::UsernameValueTyping => "username_value_typing",
            Stage::ChartVisible => "chart_visible",
            Stage::RevealingCard(_) => "revealing_card",
            Stage::SummaryRequested => "summary_requested",
            Stage::ButtonVisible => "button_visible",
            Stage::Stamped => "stamped",
            Stage::Exiting => "exiting",
            Stage::Navigated => "navigated",
        }
    }

    /// Whether `next` is the single legal successor of `self`.
    pub fn admits(&self, next: Stage) -> bool {
        match (*self, next) {
            (Stage::Idle, Stage::DateTyping)
            | (Stage::DateTyping, Stage::UsernameLabelTyping)
            | (Stage::UsernameLabelTyping, Stage::UsernameValueTyping)
            | (Stage::UsernameValueTyping, Stage::ChartVisible)
            | (Stage::ChartVisible, Stage::RevealingCard(1))
            | (Stage::ChartVisible, Stage::SummaryRequested)
            | (Stage::RevealingCard(_), Stage::SummaryRequested)
            | (Stage::SummaryRequested, Stage::ButtonVisible)
            | (Stage::ButtonVisible, Stage::Stamped)
            | (Stage::Stamped, Stage::Exiting)
            | (Stage::Exiting, Stage::Navigated) => true,
            (Stage::RevealingCard(i), Stage::RevealingCard(j)) => j == i + 1,
            _ => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::RevealingCard(i) => write!(f, "revealing_card[{}]", i),
            other => f.write_str(other.name()),
        }
    }
}

/// Everything the results panel draws once the prescription is shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsContent {
    pub date: String,
    pub nickname: String,
    pub chart: Vec<ChartPoint>,
    pub cards: Vec<Card>,
}

/// Snapshot of what the results view currently shows.
///
/// Flags only move forward. The one exception is `button_shown`, which the
/// exit transition clears when the stamp replaces the button.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisclosureState {
    pub stage: Stage,
    pub content: Option<ResultsContent>,
    pub prescription_shown: bool,
    pub date_shown: bool,
    pub username_label_shown: bool,
    pub username_shown: bool,
    pub chart_shown: bool,
    pub visible_cards: usize,
    pub summary_requested: bool,
    pub button_shown: bool,
    pub stamp_shown: bool,
    pub transition_started: bool,
    pub navigated_to: Option<String>,
}

impl DisclosureState {
    pub fn advance(&mut self, next: Stage) -> Result<(), ViewError> {
        if !self.stage.admits(next) {
            return Err(ViewError::Transition {
                from: self.stage,
                to: next,
            });
        }
        match next {
            Stage::Idle => {}
            Stage::DateTyping => {
                self.prescription_shown = true;
                self.date_shown = true;
            }
            Stage::UsernameLabelTyping => self.username_label_shown = true,
            Stage::UsernameValueTyping => self.username_shown = true,
            Stage::ChartVisible => self.chart_shown = true,
            Stage::RevealingCard(i) => self.visible_cards = i,
            Stage::SummaryRequested => self.summary_requested = true,
            Stage::ButtonVisible => self.button_shown = true,
            Stage::Stamped => {
                self.button_shown = false;
                self.stamp_shown = true;
            }
            Stage::Exiting => self.transition_started = true,
            Stage::Navigated => {}
        }
        self.stage = next;
        Ok(())
    }
}

/// Single writer of a view's state. Writes stop for good once the view's
/// token is cancelled.
#[derive(Debug)]
pub struct StatePublisher {
    tx: watch::Sender<DisclosureState>,
    cancel: CancellationToken,
}

impl StatePublisher {
    pub fn new(cancel: CancellationToken) -> Self {
        let (tx, _rx) = watch::channel(DisclosureState::default());
        Self { tx, cancel }
    }

    pub fn subscribe(&self) -> watch::Receiver<DisclosureState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> DisclosureState {
        self.tx.borrow().clone()
    }

    pub fn stage(&self) -> Stage {
        self.tx.borrow().stage
    }

    /// Applies `f` to the live state. Nothing is published if `f` fails or
    /// the view has been torn down.
    pub fn apply<F>(&self, f: F) -> Result<(), ViewError>
    where
        F: FnOnce(&mut DisclosureState) -> Result<(), ViewError>,
    {
        if self.cancel.is_cancelled() {
            return Err(ViewError::TornDown);
        }
        let mut outcome = Ok(());
        self.tx.send_if_modified(|state| {
            let mut next = state.clone();
            outcome = f(&mut next);
            if outcome.is_ok() && next != *state {
                *state = next;
                true
            } else {
                false
            }
        });
        outcome
    }

    pub fn advance(&self, next: Stage) -> Result<(), ViewError> {
        self.apply(|s| s.advance(next))
    }
}
