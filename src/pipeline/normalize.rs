//! Recognizer-noise canonicalization.
//!
//! Runs before any date or keyword matching: maps visually-confusable
//! glyphs to digits inside date-like runs, collapses duplicated separator
//! tokens, and tightens whitespace around date-separator punctuation.
//! Pure function over the text; `normalize(normalize(x)) == normalize(x)`.

use std::sync::LazyLock;

use regex::Regex;

/// Glyph→digit substitution table. Applied only inside date-like runs so
/// ordinary prose is never touched.
const GLYPH_TABLE: &[(char, char)] = &[
    ('O', '0'),
    ('o', '0'),
    ('I', '1'),
    ('l', '1'),
    ('|', '1'),
    ('Z', '2'),
    ('z', '2'),
    ('S', '5'),
    ('s', '5'),
    ('B', '8'),
];

/// A run of digits, confusable glyphs and date separators long enough to
/// plausibly be a mangled date.
static DATE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9OoIl|ZzSsB./\-]{4,}").expect("valid regex"));

/// Whitespace around a date separator between two digits. Spaces and
/// tabs only: newlines are semantic.
static LOOSE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)[ \t]+([./\-])[ \t]*(\d)|(\d)[ \t]*([./\-])[ \t]+(\d)").expect("valid regex"));

/// Duplicated separator between two digits (`2023--04`, `04..15`).
static DOUBLED_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)([./\-])[./\-]+(\d)").expect("valid regex"));

/// Canonicalize recognizer output. Idempotent and side-effect free.
pub fn normalize(text: &str) -> String {
    let mut out = substitute_glyphs(text);
    out = fixpoint(&out, tighten_separators);
    out = fixpoint(&out, collapse_separators);
    out
}

/// Replace confusable glyphs with digits inside date-like runs.
///
/// A run qualifies when it holds at least two real digits and at least
/// as many digits as letters. That admits `2O23` and `2023.O4.15` while
/// leaving words like `loss` alone.
fn substitute_glyphs(text: &str) -> String {
    DATE_RUN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let run = &caps[0];
            let digits = run.chars().filter(|c| c.is_ascii_digit()).count();
            let letters = run.chars().filter(|c| c.is_ascii_alphabetic()).count();
            if digits >= 2 && digits >= letters {
                run.chars()
                    .map(|c| {
                        GLYPH_TABLE
                            .iter()
                            .find(|(from, _)| *from == c)
                            .map(|(_, to)| *to)
                            .unwrap_or(c)
                    })
                    .collect::<String>()
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

fn tighten_separators(text: &str) -> String {
    LOOSE_SEPARATOR
        .replace_all(text, |caps: &regex::Captures<'_>| {
            // the alternation binds either groups 1-3 or 4-6
            let (a, sep, b) = if caps.get(1).is_some() {
                (&caps[1], &caps[2], &caps[3])
            } else {
                (&caps[4], &caps[5], &caps[6])
            };
            format!("{a}{sep}{b}")
        })
        .into_owned()
}

fn collapse_separators(text: &str) -> String {
    DOUBLED_SEPARATOR
        .replace_all(text, "$1$2$3")
        .into_owned()
}

/// Apply `step` until the text stops changing. Each step only removes
/// characters, so this terminates.
fn fixpoint(text: &str, step: fn(&str) -> String) -> String {
    let mut current = text.to_string();
    loop {
        let next = step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_confusable_glyphs_in_date_runs() {
        assert_eq!(normalize("2O23.O4.15"), "2023.04.15");
        assert_eq!(normalize("2l.12.2O23"), "21.12.2023");
        assert_eq!(normalize("order 2023O415"), "order 20230415");
    }

    #[test]
    fn leaves_prose_untouched() {
        let text = "loss of Bliss | solo sellers";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn collapses_duplicated_separators() {
        assert_eq!(normalize("2023--04--15"), "2023-04-15");
        assert_eq!(normalize("2023..04..15"), "2023.04.15");
        assert_eq!(normalize("2023//04//15"), "2023/04/15");
    }

    #[test]
    fn tightens_whitespace_around_separators() {
        assert_eq!(normalize("2023 - 04 - 15"), "2023-04-15");
        assert_eq!(normalize("2023- 04 -15"), "2023-04-15");
        assert_eq!(normalize("delivered 2023 . 04 . 15 ok"), "delivered 2023.04.15 ok");
    }

    #[test]
    fn newlines_are_preserved() {
        let text = "order date\n2023-04-15";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn mixed_noise_normalizes_fully() {
        assert_eq!(normalize("2O23--O4--l5"), "2023-04-15");
    }

    #[test]
    fn idempotent_over_noisy_fixtures() {
        let fixtures = [
            "2O23.O4.15 order placed",
            "2023 - 04 - 15\nshipped 2023--05--01",
            "review from 2l.12.2O23 | solo sellers",
            "plain text with no dates at all",
            "S10. looks odd but 2023/06/07 is fine",
        ];
        for f in fixtures {
            let once = normalize(f);
            let twice = normalize(&once);
            assert_eq!(once, twice, "normalize must be idempotent for {f:?}");
        }
    }
}
