//! Channel-specific date candidate extraction.
//!
//! The base channel sweeps every line for date patterns. The scene
//! channels (review/order/logistics) score lines against their keyword
//! lexicon and feed only the strongest lines into date extraction,
//! looking one line either side to catch keyword/date pairs the
//! recognizer split across lines.

use chrono::NaiveDate;

use crate::models::anchor::DateCandidate;
use crate::models::case::DefinedPeriod;
use crate::models::enums::Channel;
use crate::rules::Lexicons;

use super::dates;

/// Lines that survive scoring per scene channel.
const TOP_SCORED_LINES: usize = 12;

/// Line score components, mirroring what the selection cares about:
/// a lexicon hit is the dominant signal, a 4-digit year and a month-day
/// shape strengthen it, uncertain-time phrasing pushes the line down.
const KEYWORD_POINTS: i32 = 4;
const YEAR_POINTS: i32 = 2;
const MONTH_DAY_POINTS: i32 = 1;
const UNCERTAIN_PENALTY: i32 = 3;

/// Extract candidates from every channel, base first, then scenes in
/// lexicon order. The resolver re-ranks; order here only breaks ties.
pub fn extract_all(
    text: &str,
    lexicons: &Lexicons,
    period: Option<&DefinedPeriod>,
    today: NaiveDate,
) -> Vec<DateCandidate> {
    let mut out = base_candidates(text, period, today);
    out.extend(scene_candidates(text, Channel::Review, &lexicons.review, lexicons, period, today));
    out.extend(scene_candidates(text, Channel::Order, &lexicons.order, lexicons, period, today));
    out.extend(scene_candidates(
        text,
        Channel::Logistics,
        &lexicons.logistics,
        lexicons,
        period,
        today,
    ));
    out
}

/// Base channel: plain pattern sweep, no scene context.
pub fn base_candidates(
    text: &str,
    period: Option<&DefinedPeriod>,
    today: NaiveDate,
) -> Vec<DateCandidate> {
    let mut out = Vec::new();
    for line in text.lines() {
        for date in dates::dates_in_line(line, period, today) {
            push_unique(&mut out, date, Channel::Base, line, 0);
        }
    }
    out
}

/// One scene channel: score lines, keep the top few, extract dates with a
/// ±1-line window fallback.
pub fn scene_candidates(
    text: &str,
    channel: Channel,
    keywords: &[String],
    lexicons: &Lexicons,
    period: Option<&DefinedPeriod>,
    today: NaiveDate,
) -> Vec<DateCandidate> {
    let lines: Vec<&str> = text.lines().collect();

    let mut scored: Vec<(usize, i32)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let score = score_line(line, keywords, &lexicons.uncertain_time);
            (score > 0).then_some((idx, score))
        })
        .collect();
    // strongest lines first; earlier lines win ties
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(TOP_SCORED_LINES);

    let mut out = Vec::new();
    for (idx, score) in scored {
        let line = lines[idx];
        let mut found = dates::dates_in_line(line, period, today);
        let mut source = line.to_string();

        if found.is_empty() {
            // keyword and date may be recognizer-split across lines
            let window = window_text(&lines, idx);
            found = dates::dates_in_line(&window, period, today);
            source = window;
        }

        if channel == Channel::Review {
            // mangled review timestamps: "<year> <3-4 digit blob>"
            found.extend(dates::decode_year_blobs(&source));
            found.sort();
            found.dedup();
        }

        for date in found {
            push_unique(&mut out, date, channel, &source, score);
        }
    }
    out
}

fn score_line(line: &str, keywords: &[String], uncertain: &[String]) -> i32 {
    let lower = line.to_lowercase();
    let mut score = 0;
    if Lexicons::hit(&lower, keywords) {
        score += KEYWORD_POINTS;
    }
    if dates::has_year(line) {
        score += YEAR_POINTS;
    }
    if dates::has_month_day(line) {
        score += MONTH_DAY_POINTS;
    }
    if Lexicons::hit(&lower, uncertain) {
        score -= UNCERTAIN_PENALTY;
    }
    score
}

fn window_text(lines: &[&str], idx: usize) -> String {
    let start = idx.saturating_sub(1);
    let end = (idx + 1).min(lines.len() - 1);
    lines[start..=end].join("\n")
}

fn push_unique(
    out: &mut Vec<DateCandidate>,
    date: NaiveDate,
    channel: Channel,
    source_line: &str,
    line_score: i32,
) {
    if out.iter().any(|c| c.date == date && c.channel == channel) {
        return;
    }
    out.push(DateCandidate {
        date,
        channel,
        source_line: source_line.to_string(),
        line_score,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn period() -> DefinedPeriod {
        DefinedPeriod::new(d(2022, 1, 1), d(2024, 12, 31))
    }

    const TODAY: fn() -> NaiveDate = || d(2026, 8, 1);

    #[test]
    fn base_channel_sweeps_all_lines() {
        let text = "header\ncontract signed 2023-04-15\nfooter 2024-01-02";
        let candidates = base_candidates(text, Some(&period()), TODAY());
        let dates: Vec<NaiveDate> = candidates.iter().map(|c| c.date).collect();
        assert!(dates.contains(&d(2023, 4, 15)));
        assert!(dates.contains(&d(2024, 1, 2)));
        assert!(candidates.iter().all(|c| c.channel == Channel::Base));
    }

    #[test]
    fn scene_channel_requires_keyword_signal() {
        let lex = Lexicons::default();
        let text = "random line 2023-04-15\nanother line";
        let candidates =
            scene_candidates(text, Channel::Order, &lex.order, &lex, Some(&period()), TODAY());
        assert!(candidates.is_empty());
    }

    #[test]
    fn scene_channel_extracts_from_keyword_line() {
        let lex = Lexicons::default();
        let text = "order placed 2023-04-15\nnoise";
        let candidates =
            scene_candidates(text, Channel::Order, &lex.order, &lex, Some(&period()), TODAY());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].date, d(2023, 4, 15));
        assert_eq!(candidates[0].channel, Channel::Order);
        assert!(candidates[0].line_score >= KEYWORD_POINTS);
    }

    #[test]
    fn split_keyword_and_date_caught_by_window() {
        let lex = Lexicons::default();
        let text = "payment received\n2023-06-02";
        let candidates =
            scene_candidates(text, Channel::Order, &lex.order, &lex, Some(&period()), TODAY());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].date, d(2023, 6, 2));
        assert!(candidates[0].source_line.contains("payment received"));
    }

    #[test]
    fn uncertain_phrasing_demotes_line() {
        let lex = Lexicons::default();
        // "valid until" alone drags the keyword-free line negative
        assert!(score_line("valid until 12/31", &lex.order, &lex.uncertain_time) < 1);
        // keyword + year beats the penalty
        assert!(score_line("payment valid until 2023", &lex.order, &lex.uncertain_time) > 0);
    }

    #[test]
    fn top_line_cap_bounds_extraction() {
        let lex = Lexicons::default();
        let mut text = String::new();
        for i in 0..40 {
            text.push_str(&format!("order no {} placed 2023-04-{:02}\n", i, (i % 28) + 1));
        }
        let candidates =
            scene_candidates(&text, Channel::Order, &lex.order, &lex, Some(&period()), TODAY());
        // 12 lines at most feed extraction, one date each
        assert!(candidates.len() <= TOP_SCORED_LINES);
    }

    #[test]
    fn review_channel_decodes_year_blobs() {
        let lex = Lexicons::default();
        let text = "verified purchase review 2023 415";
        let candidates =
            scene_candidates(text, Channel::Review, &lex.review, &lex, Some(&period()), TODAY());
        assert!(candidates.iter().any(|c| c.date == d(2023, 4, 15)));
    }

    #[test]
    fn order_channel_ignores_year_blobs() {
        let lex = Lexicons::default();
        let text = "order confirmed 2023 415";
        let candidates =
            scene_candidates(text, Channel::Order, &lex.order, &lex, Some(&period()), TODAY());
        assert!(!candidates.iter().any(|c| c.date == d(2023, 4, 15)));
    }

    #[test]
    fn extract_all_spans_channels() {
        let lex = Lexicons::default();
        let text = "contract 2023-03-01\nreviewed 2023-04-15\nshipped on 2023-04-18";
        let candidates = extract_all(text, &lex, Some(&period()), TODAY());
        assert!(candidates.iter().any(|c| c.channel == Channel::Base));
        assert!(candidates.iter().any(|c| c.channel == Channel::Review));
        assert!(candidates.iter().any(|c| c.channel == Channel::Logistics));
    }

    #[test]
    fn duplicate_dates_within_channel_collapse() {
        let lex = Lexicons::default();
        let text = "order placed 2023-04-15\norder confirmed 2023-04-15";
        let candidates =
            scene_candidates(text, Channel::Order, &lex.order, &lex, Some(&period()), TODAY());
        assert_eq!(candidates.len(), 1);
    }
}
