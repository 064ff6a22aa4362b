//! Keyword lexicons driving channel extraction, context classification,
//! and document-name heuristics.
//!
//! These ship with English defaults and are fully replaceable by the
//! embedding application: the engine treats them as injected data, the
//! same way the numeric rule blocks are injected. Matching is always
//! case-insensitive on pre-lowercased text.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::enums::DocumentKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicons {
    /// Scene-channel keywords: customer review / feedback context.
    pub review: Vec<String>,
    /// Scene-channel keywords: order / purchase / payment context.
    pub order: Vec<String>,
    /// Scene-channel keywords: shipping / delivery context.
    pub logistics: Vec<String>,
    /// Phrases signalling a date is not a usage date (validity windows,
    /// print timestamps, deadlines).
    pub uncertain_time: Vec<String>,
    /// Context classification: transaction-date phrasing.
    pub transaction_context: Vec<String>,
    /// Context classification: system/machine-generated phrasing.
    pub system_context: Vec<String>,
    /// Context classification: content-claimed phrasing.
    pub content_context: Vec<String>,
    /// Global noise-exclusion phrases that forcibly demote nearby dates.
    pub noise_global: Vec<String>,
    /// Additional noise-exclusion phrases per document kind.
    pub noise_by_kind: HashMap<DocumentKind, Vec<String>>,
    /// Document-name hints: structured evidence (notices, contracts,
    /// invoices, order exports) that re-scan rounds prioritize.
    pub structured_names: Vec<String>,
    /// Document-name hints: notice/fact-like documents for round 1.
    pub notice_names: Vec<String>,
    /// Document-name hints: promotional/display material.
    pub promotional_names: Vec<String>,
    /// Document-name hints: weak generic-image names.
    pub weak_names: Vec<String>,
}

impl Default for Lexicons {
    fn default() -> Self {
        let mut noise_by_kind = HashMap::new();
        noise_by_kind.insert(
            DocumentKind::Notice,
            strings(&["reply within", "service date", "deadline for response"]),
        );
        noise_by_kind.insert(
            DocumentKind::Procedural,
            strings(&["filing receipt", "acceptance date", "docket"]),
        );

        Self {
            review: strings(&[
                "review",
                "reviewed",
                "rating",
                "feedback",
                "comment",
                "purchased",
                "verified purchase",
                "follow-up review",
            ]),
            order: strings(&[
                "order",
                "order no",
                "purchase",
                "payment",
                "paid",
                "invoice",
                "transaction",
                "checkout",
                "receipt",
            ]),
            logistics: strings(&[
                "shipping",
                "shipped",
                "delivery",
                "delivered",
                "tracking",
                "courier",
                "waybill",
                "signed for",
                "dispatched",
            ]),
            uncertain_time: strings(&[
                "valid until",
                "expires",
                "expiry",
                "print date",
                "printed on",
                "deadline",
                "retrieved on",
            ]),
            transaction_context: strings(&[
                "order placed",
                "order date",
                "payment received",
                "paid on",
                "invoice date",
                "transaction date",
                "purchase date",
                "shipped on",
                "delivered on",
                "signed on",
            ]),
            system_context: strings(&[
                "generated",
                "exported",
                "printed",
                "screenshot",
                "captured",
                "timestamp",
                "system time",
                "retrieved",
            ]),
            content_context: strings(&[
                "dated",
                "as of",
                "effective",
                "held on",
                "taken on",
                "published",
                "issued",
            ]),
            noise_global: strings(&[
                "valid until",
                "expiry",
                "expires",
                "business license",
                "license term",
                "registration date",
                "filing date",
                "inspection",
                "annual report",
            ]),
            noise_by_kind,
            structured_names: strings(&[
                "notice",
                "contract",
                "agreement",
                "invoice",
                "order",
                "receipt",
                "statement",
            ]),
            notice_names: strings(&["notice", "notification", "summons", "letter"]),
            promotional_names: strings(&[
                "brochure", "flyer", "poster", "banner", "promo", "display", "booth", "storefront",
            ]),
            weak_names: strings(&["img", "img_", "dsc", "dsc_", "photo", "image", "scan", "pic"]),
        }
    }
}

impl Lexicons {
    /// Case-insensitive containment test against one keyword list.
    pub fn hit(haystack_lower: &str, keys: &[String]) -> bool {
        keys.iter().any(|k| haystack_lower.contains(k.as_str()))
    }

    /// Count of distinct keywords from `keys` present in the text.
    pub fn hit_count(haystack_lower: &str, keys: &[String]) -> usize {
        keys.iter()
            .filter(|k| haystack_lower.contains(k.as_str()))
            .count()
    }

    /// Noise-exclusion test: global lexicon plus the per-kind extension.
    pub fn noise_hit(&self, line_lower: &str, kind: DocumentKind) -> bool {
        if Self::hit(line_lower, &self.noise_global) {
            return true;
        }
        self.noise_by_kind
            .get(&kind)
            .is_some_and(|extra| Self::hit(line_lower, extra))
    }

    /// All scene-channel keywords combined, for signal scoring.
    pub fn scene_hit_count(&self, text_lower: &str) -> usize {
        Self::hit_count(text_lower, &self.review)
            + Self::hit_count(text_lower, &self.order)
            + Self::hit_count(text_lower, &self.logistics)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
