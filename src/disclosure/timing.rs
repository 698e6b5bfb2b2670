//! The reveal schedule. Each stage waits for an estimate of how long the
//! previous stage's typing animation takes; there is no completion signal.

use std::time::Duration;

use super::state::Stage;

/// Label typed before the nickname.
pub const USERNAME_LABEL: &str = "사용자명:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub per_char: Duration,
    pub prescription_delay: Duration,
    pub date_padding: Duration,
    pub label_padding: Duration,
    pub username_padding: Duration,
    pub chart_settle: Duration,
    pub card_interval: Duration,
    pub button_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            per_char: Duration::from_millis(40),
            prescription_delay: Duration::from_millis(500),
            date_padding: Duration::from_millis(200),
            label_padding: Duration::from_millis(100),
            username_padding: Duration::from_millis(200),
            chart_settle: Duration::from_millis(1000),
            card_interval: Duration::from_millis(300),
            button_delay: Duration::from_millis(500),
        }
    }
}

/// `chars(text) × per_char + padding`, counting Unicode scalar values.
/// Saturates at `Duration::MAX` instead of overflowing.
pub fn typing_delay(text: &str, per_char: Duration, padding: Duration) -> Duration {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    per_char
        .checked_mul(chars)
        .unwrap_or(Duration::MAX)
        .saturating_add(padding)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Wait before entering `stage`.
    pub delay: Duration,
    pub stage: Stage,
}

/// Full reveal schedule for a date, a nickname and `cards` cards.
pub fn plan(date: &str, nickname: &str, cards: usize, timing: &Timing) -> Vec<Step> {
    let mut steps = Vec::with_capacity(cards + 6);
    let mut push = |delay, stage| steps.push(Step { delay, stage });

    push(timing.prescription_delay, Stage::DateTyping);
    push(
        typing_delay(date, timing.per_char, timing.date_padding),
        Stage::UsernameLabelTyping,
    );
    push(
        typing_delay(USERNAME_LABEL, timing.per_char, timing.label_padding),
        Stage::UsernameValueTyping,
    );
    push(
        typing_delay(nickname, timing.per_char, timing.username_padding),
        Stage::ChartVisible,
    );
    for i in 1..=cards {
        let delay = if i == 1 {
            timing.chart_settle + timing.card_interval
        } else {
            timing.card_interval
        };
        push(delay, Stage::RevealingCard(i));
    }
    let summary_delay = if cards == 0 { timing.chart_settle } else { Duration::ZERO };
    push(summary_delay, Stage::SummaryRequested);
    push(timing.button_delay, Stage::ButtonVisible);
    steps
}

/// Offset of every step from the start of the schedule.
pub fn offsets(steps: &[Step]) -> Vec<(Duration, Stage)> {
    let mut at = Duration::ZERO;
    steps
        .iter()
        .map(|s| {
            at = at.saturating_add(s.delay);
            (at, s.stage)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_typing_delay_formula() {
        assert_eq!(typing_delay("2026-10-17", ms(40), ms(200)), ms(600));
        assert_eq!(typing_delay(USERNAME_LABEL, ms(40), ms(100)), ms(300));
        assert_eq!(typing_delay("", ms(40), ms(200)), ms(200));
    }

    #[test]
    fn test_typing_delay_saturates() {
        let huge = Duration::from_millis(u64::MAX);
        assert_eq!(typing_delay("2026-10-17", huge, ms(200)), Duration::MAX);
        assert_eq!(typing_delay("", huge, ms(200)), ms(200));
        let at = offsets(&plan("2026-10-17", "tester", 2, &Timing { per_char: huge, ..Timing::default() }));
        assert_eq!(at.last().map(|(t, _)| *t), Some(Duration::MAX));
    }

    #[test]
    fn test_plan_with_two_cards() {
        let steps = plan("2026-10-17", "tester", 2, &Timing::default());
        let stages: Vec<Stage> = steps.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::DateTyping,
                Stage::UsernameLabelTyping,
                Stage::UsernameValueTyping,
                Stage::ChartVisible,
                Stage::RevealingCard(1),
                Stage::RevealingCard(2),
                Stage::SummaryRequested,
                Stage::ButtonVisible,
            ]
        );
        let at = offsets(&steps);
        assert_eq!(at[0].0, ms(500));
        assert_eq!(at[3].0, ms(500 + 600 + 300 + 440));
        assert_eq!(at[4].0, ms(1840 + 1300));
        assert_eq!(at[5].0, ms(3140 + 300));
        assert_eq!(at[6].0, at[5].0);
        assert_eq!(at[7].0, ms(3940));
    }

    #[test]
    fn test_plan_without_cards_still_reaches_button() {
        let steps = plan("2026-10-17", "tester", 0, &Timing::default());
        assert!(steps.iter().all(|s| !matches!(s.stage, Stage::RevealingCard(_))));
        let at = offsets(&steps);
        let (last_at, last) = *at.last().unwrap();
        assert_eq!(last, Stage::ButtonVisible);
        assert_eq!(last_at, ms(1840 + 1000 + 500));
    }

    #[test]
    fn test_cards_strictly_ordered() {
        for n in 0..=5 {
            let at = offsets(&plan("2026-10-17", "새싹", n, &Timing::default()));
            let cards: Vec<(Duration, usize)> = at
                .iter()
                .filter_map(|(t, s)| match s {
                    Stage::RevealingCard(i) => Some((*t, *i)),
                    _ => None,
                })
                .collect();
            assert_eq!(cards.len(), n);
            for pair in cards.windows(2) {
                assert!(pair[1].0 > pair[0].0);
                assert_eq!(pair[1].1, pair[0].1 + 1);
            }
        }
    }

    #[test]
    fn test_korean_nickname_counts_characters() {
        let at = offsets(&plan("2026-10-17", "새싹", 0, &Timing::default()));
        // two syllables, not six UTF-8 bytes
        assert_eq!(at[3].0 - at[2].0, ms(2 * 40 + 200));
    }
}
