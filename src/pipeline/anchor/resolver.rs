//! Multi-channel time-anchor arbitration.
//!
//! Merges the candidates every channel proposed for one document, scores
//! them against the rule profile's anchor weights, ranks them, and
//! derives the selected anchor range, confidence tier, conflict flag and
//! audit rationale. The function is pure: resolving the same inputs
//! twice yields the same anchor.

use chrono::NaiveDate;

use crate::models::anchor::{DateCandidate, DateRange, RankedCandidate, TimeAnchor};
use crate::models::case::DefinedPeriod;
use crate::models::enums::{AnchorType, Channel, Confidence, DocumentKind};
use crate::rules::{AnchorWeights, Lexicons};

use super::classify;

/// Everything the resolver needs besides the candidates themselves.
pub struct ResolverContext<'a> {
    pub kind: DocumentKind,
    pub period: Option<&'a DefinedPeriod>,
    /// Container/carrier metadata date, the last-resort anchor source.
    pub formation_date: Option<NaiveDate>,
    pub weights: &'a AnchorWeights,
    pub lexicons: &'a Lexicons,
}

/// Resolve a document's time anchor from its channel candidates.
pub fn resolve(candidates: &[DateCandidate], ctx: &ResolverContext<'_>) -> TimeAnchor {
    let mut ranked = rank_candidates(candidates, ctx);
    ranked.truncate(ctx.weights.top_k);

    if ranked.is_empty() {
        return finish(metadata_fallback(ctx), ctx);
    }

    let period_known = ctx.period.is_some();
    let has_in = ranked.iter().any(|c| c.in_period == Some(true));
    let has_out = ranked.iter().any(|c| c.in_period == Some(false));
    let conflict = period_known && has_in && has_out;

    let selected: Vec<&RankedCandidate> = if conflict {
        ranked.iter().filter(|c| c.in_period == Some(true)).collect()
    } else {
        ranked.iter().collect()
    };

    let mut dates: Vec<NaiveDate> = selected.iter().map(|c| c.date).collect();
    dates.sort();
    dates.dedup();
    let range = DateRange::new(dates[0], *dates.last().expect("selected is non-empty"));

    let best = selected[0];
    let confidence = derive_confidence(&dates, best);
    let selection_rule = if conflict {
        format!(
            "top-{} candidates mixed in-period and out-of-period dates; selection narrowed to the {} in-period candidate(s)",
            ranked.len(),
            selected.len()
        )
    } else {
        format!(
            "selected all top-{} candidate(s); best from {} channel",
            ranked.len(),
            best.channel
        )
    };

    finish(
        TimeAnchor {
            range: Some(range),
            confidence,
            anchor_type: best.anchor_type,
            source_channel: best.channel,
            conflict,
            candidates: ranked,
            selection_rule,
        },
        ctx,
    )
}

/// Score and rank all candidates: in-period first, then channel priority,
/// then score, then earliest date.
fn rank_candidates(candidates: &[DateCandidate], ctx: &ResolverContext<'_>) -> Vec<RankedCandidate> {
    let w = ctx.weights;
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|c| {
            let line_ctx = classify::classify_line(&c.source_line, ctx.kind, ctx.lexicons);
            let in_period = ctx.period.map(|p| p.contains(c.date));

            let mut score = channel_weight(c.channel, w);
            match in_period {
                Some(true) => score += w.in_period_bonus,
                Some(false) => score -= w.out_period_penalty,
                None => {}
            }
            score += match line_ctx.anchor_type {
                AnchorType::TransactionDate => w.type_transaction_bonus,
                AnchorType::ContentClaimed => w.type_content_bonus,
                AnchorType::SystemGenerated => w.type_system_bonus,
                AnchorType::Uncertain => -w.type_uncertain_penalty,
            };
            if line_ctx.noise_excluded {
                score -= w.noise_penalty;
            }

            RankedCandidate {
                date: c.date,
                channel: c.channel,
                anchor_type: line_ctx.anchor_type,
                score,
                in_period,
                noise_excluded: line_ctx.noise_excluded,
                source_line: c.source_line.clone(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        let a_in = a.in_period == Some(true);
        let b_in = b.in_period == Some(true);
        b_in.cmp(&a_in)
            .then(b.channel.priority().cmp(&a.channel.priority()))
            .then(b.score.total_cmp(&a.score))
            .then(a.date.cmp(&b.date))
    });
    // a date proposed by several channels keeps only its best-ranked entry
    let mut seen = Vec::new();
    ranked.retain(|c| {
        if seen.contains(&c.date) {
            false
        } else {
            seen.push(c.date);
            true
        }
    });
    ranked
}

fn channel_weight(channel: Channel, w: &AnchorWeights) -> f64 {
    match channel {
        Channel::Review => w.channel_review,
        Channel::Order => w.channel_order,
        Channel::Logistics => w.channel_logistics,
        Channel::Base => w.channel_base,
    }
}

/// Confidence ladder over the selected set.
///
/// Two or more distinct dates corroborate each other; a single clean
/// scene-channel date stands on its own; everything weaker lands on
/// Medium or Low.
fn derive_confidence(dates: &[NaiveDate], best: &RankedCandidate) -> Confidence {
    if dates.len() >= 2 {
        return Confidence::High;
    }
    let clean = best.anchor_type != AnchorType::Uncertain && !best.noise_excluded;
    if best.channel.is_scene() && clean {
        Confidence::High
    } else if best.channel.is_scene() || clean {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// No extracted candidates: fall back to container metadata, but only
/// within the acceptance window around the defined period. A carrier
/// date far from the window is noise, never silently trusted.
fn metadata_fallback(ctx: &ResolverContext<'_>) -> TimeAnchor {
    let Some(formation) = ctx.formation_date else {
        return TimeAnchor::unresolved("no candidate dates extracted from any channel");
    };
    let Some(period) = ctx.period else {
        return TimeAnchor::unresolved(
            "container metadata date discarded: defined period unresolved, acceptance window unverifiable",
        );
    };
    if period.within_margin(formation, ctx.weights.metadata_window_days) {
        TimeAnchor {
            range: Some(DateRange::single(formation)),
            confidence: Confidence::Medium,
            anchor_type: AnchorType::SystemGenerated,
            source_channel: Channel::Base,
            conflict: false,
            candidates: Vec::new(),
            selection_rule: format!(
                "container metadata date {} accepted: within {} days of the defined period",
                formation, ctx.weights.metadata_window_days
            ),
        }
    } else {
        TimeAnchor::unresolved(format!(
            "container metadata date {} discarded: outside the {}-day acceptance window around the defined period",
            formation, ctx.weights.metadata_window_days
        ))
    }
}

/// Apply the procedural-document demotion: the anchor keeps its range for
/// reference-lane coverage, but its confidence is N/A and never counts
/// toward substantive in-period tallies.
fn finish(mut anchor: TimeAnchor, ctx: &ResolverContext<'_>) -> TimeAnchor {
    if ctx.kind.is_procedural() {
        anchor.confidence = Confidence::NotApplicable;
        anchor.selection_rule = format!(
            "{}; procedural document: dates demoted uniformly to reference-only",
            anchor.selection_rule
        );
    }
    anchor
}
