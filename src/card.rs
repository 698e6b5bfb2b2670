//! Layout of recommendation card bodies.
//!
//! Content lines arrive as plain sentences. A fixed set of key phrases is
//! emphasised, and some of them start (or end) a visual line.

use serde::Serialize;

use crate::api::RecommendationCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Emphasis(String),
    Break,
}

struct Highlight {
    phrase: &'static str,
    /// Part of `phrase` drawn emphasised; empty for none.
    emphasis: &'static str,
    break_before: bool,
    break_after: bool,
}

const fn hl(phrase: &'static str, emphasis: &'static str, break_before: bool, break_after: bool) -> Highlight {
    Highlight {
        phrase,
        emphasis,
        break_before,
        break_after,
    }
}

const HIGHLIGHTS: &[Highlight] = &[
    hl("활력 충전", "활력 충전", true, false),
    hl("스트레스 해소", "스트레스 해소", true, false),
    hl("목표 달성", "목표 달성", true, false),
    hl("새로운 활동 도전과 자기효능감 강화", "자기효능감 강화", false, false),
    hl("가족과 친구와 함께", "", false, true),
    hl("피크닉, 소규모 모임", "피크닉, 소규모 모임", false, false),
    hl("다양한 커뮤니티 활동", "커뮤니티 활동", true, false),
    hl("마음 편안", "마음 편안", true, false),
    hl("내면 평화", "내면 평화", true, false),
    hl("땀 흘리기", "땀 흘리기", true, false),
    hl("기분 전환", "기분 전환", false, false),
    hl("마음 정리", "마음 정리", true, false),
    hl("명상과 사색", "명상과 사색", false, false),
];

fn push_text(out: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(prev)) = out.last_mut() {
        prev.push_str(text);
    } else {
        out.push(Segment::Text(text.to_string()));
    }
}

fn push_highlight(out: &mut Vec<Segment>, h: &Highlight) {
    if h.break_before {
        out.push(Segment::Break);
    }
    match h.phrase.find(h.emphasis).filter(|_| !h.emphasis.is_empty()) {
        Some(at) => {
            push_text(out, &h.phrase[..at]);
            out.push(Segment::Emphasis(h.emphasis.to_string()));
            push_text(out, &h.phrase[at + h.emphasis.len()..]);
        }
        None => push_text(out, h.phrase),
    }
    if h.break_after {
        out.push(Segment::Break);
    }
}

/// Splits one content line into segments. Each phrase is styled at its first
/// occurrence only.
pub fn render_line(line: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut used = vec![false; HIGHLIGHTS.len()];
    let mut rest = line;

    loop {
        let next = HIGHLIGHTS
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .filter_map(|(i, h)| rest.find(h.phrase).map(|at| (at, i)))
            .min();
        let Some((at, i)) = next else {
            push_text(&mut out, rest);
            break;
        };
        used[i] = true;
        push_text(&mut out, &rest[..at]);
        push_highlight(&mut out, &HIGHLIGHTS[i]);
        rest = &rest[at + HIGHLIGHTS[i].phrase.len()..];
    }
    out
}

/// Marker drawn in front of every content line.
pub const BULLET: &str = "• ";

/// `render_line` with the bullet marker in front.
pub fn render_item(line: &str) -> Vec<Segment> {
    let mut out = vec![Segment::Text(BULLET.to_string())];
    for seg in render_line(line) {
        match seg {
            Segment::Text(t) => push_text(&mut out, &t),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub title: String,
    pub lines: Vec<Vec<Segment>>,
}

impl Card {
    pub fn from_category(cat: &RecommendationCategory) -> Self {
        Self {
            title: cat.category.clone(),
            lines: cat.content.iter().map(|l| render_item(l)).collect(),
        }
    }
}
