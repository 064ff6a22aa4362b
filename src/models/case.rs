use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The legal window all evidence is judged against.
///
/// `start <= end` is enforced on construction. A case may run with no
/// resolved period at all; that degrades scoring (gate G1a) but never
/// blocks processing, so the period is carried as `Option<DefinedPeriod>`
/// wherever it is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DefinedPeriod {
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Range-overlap test used for anchor coverage (partial overlap counts).
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        !(end < self.start || self.end < start)
    }

    /// True when `date` falls within `days` of the period, boundaries
    /// included. Used for the container-metadata acceptance window.
    pub fn within_margin(&self, date: NaiveDate, days: i64) -> bool {
        let lo = self.start - Duration::days(days);
        let hi = self.end + Duration::days(days);
        lo <= date && date <= hi
    }

    /// Distance in days from `date` to the nearest period boundary;
    /// zero when inside the period.
    pub fn distance_days(&self, date: NaiveDate) -> i64 {
        if date < self.start {
            (self.start - date).num_days()
        } else if date > self.end {
            (date - self.end).num_days()
        } else {
            0
        }
    }
}

/// Best-guess case metadata, merged across scan rounds.
///
/// The case-metadata collaborator supplies an initial guess; manual
/// overrides, when present, win field-by-field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseFields {
    pub registration_no: Option<String>,
    pub class_no: Option<String>,
    pub applicant: Option<String>,
    pub respondent: Option<String>,
    pub mark_name: Option<String>,
    pub goods_services: Option<String>,
    pub period: Option<DefinedPeriod>,
}

impl CaseFields {
    /// Required fields still missing; drives the round 3-5 re-scan trigger.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if none_or_blank(&self.registration_no) {
            missing.push("registration_no");
        }
        if none_or_blank(&self.applicant) {
            missing.push("applicant");
        }
        if none_or_blank(&self.respondent) {
            missing.push("respondent");
        }
        if none_or_blank(&self.class_no) {
            missing.push("class_no");
        }
        if none_or_blank(&self.mark_name) {
            missing.push("mark_name");
        }
        if self.period.is_none() {
            missing.push("period");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Overlay `other` on top of self: any field present in `other`
    /// replaces ours. Used both for per-round refinement (new guess over
    /// old) and for manual overrides (overrides over final guess).
    pub fn overlay(&self, other: &CaseFields) -> CaseFields {
        CaseFields {
            registration_no: pick(&other.registration_no, &self.registration_no),
            class_no: pick(&other.class_no, &self.class_no),
            applicant: pick(&other.applicant, &self.applicant),
            respondent: pick(&other.respondent, &self.respondent),
            mark_name: pick(&other.mark_name, &self.mark_name),
            goods_services: pick(&other.goods_services, &self.goods_services),
            period: other.period.or(self.period),
        }
    }
}

fn none_or_blank(v: &Option<String>) -> bool {
    v.as_deref().map(str::trim).unwrap_or("").is_empty()
}

fn pick(preferred: &Option<String>, fallback: &Option<String>) -> Option<String> {
    match preferred.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => preferred.clone(),
        _ => fallback.clone(),
    }
}
