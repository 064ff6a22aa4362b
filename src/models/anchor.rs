use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{AnchorType, Channel, Confidence};

/// A date proposal produced by one extraction channel for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateCandidate {
    pub date: NaiveDate,
    pub channel: Channel,
    /// The line(s) the date was matched in, kept for context
    /// classification and for the audit trail.
    pub source_line: String,
    /// Line score assigned during channel extraction (0 for base hits).
    pub line_score: i32,
}

/// An inclusive date range with `start <= end` enforced on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn single(d: NaiveDate) -> Self {
        Self { start: d, end: d }
    }
}

/// A ranked candidate retained in the anchor's top-K list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub date: NaiveDate,
    pub channel: Channel,
    pub anchor_type: AnchorType,
    pub score: f64,
    pub in_period: Option<bool>,
    pub noise_excluded: bool,
    pub source_line: String,
}

/// The resolved time anchor for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAnchor {
    /// None when no date could be resolved at all.
    pub range: Option<DateRange>,
    pub confidence: Confidence,
    pub anchor_type: AnchorType,
    pub source_channel: Channel,
    /// True iff the retained top-K mixed in-period and out-of-period dates.
    pub conflict: bool,
    /// Ranked top-K candidates, best first.
    pub candidates: Vec<RankedCandidate>,
    /// Human-readable statement of the policy that produced this anchor.
    pub selection_rule: String,
}

impl TimeAnchor {
    /// An anchor that resolved nothing: confidence Low, empty candidate
    /// list, with the rationale captured in the selection rule.
    pub fn unresolved(rule: impl Into<String>) -> Self {
        Self {
            range: None,
            confidence: Confidence::Low,
            anchor_type: AnchorType::Uncertain,
            source_channel: Channel::Base,
            conflict: false,
            candidates: Vec::new(),
            selection_rule: rule.into(),
        }
    }

    /// N/A anchor for documents whose kind is outside the time-coverage
    /// lane entirely (procedural paperwork).
    pub fn out_of_lane(rule: impl Into<String>) -> Self {
        Self {
            confidence: Confidence::NotApplicable,
            ..Self::unresolved(rule)
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.range.is_some()
    }
}
