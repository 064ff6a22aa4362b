use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Confidence {
    High => "high",
    Medium => "medium",
    Low => "low",
    NotApplicable => "n/a",
});

impl Confidence {
    /// High/Medium anchors count toward substantive in-period coverage.
    pub fn is_scorable(&self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }
}

str_enum!(Channel {
    Base => "base",
    Review => "review",
    Order => "order",
    Logistics => "logistics",
});

impl Channel {
    /// Arbitration priority: review outranks order/logistics, which
    /// outrank base pattern matching.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Review => 3,
            Self::Order | Self::Logistics => 2,
            Self::Base => 1,
        }
    }

    /// Scene channels carry their own usage context; base is a plain
    /// pattern hit with no surrounding scene.
    pub fn is_scene(&self) -> bool {
        !matches!(self, Self::Base)
    }
}

str_enum!(AnchorType {
    TransactionDate => "transaction_date",
    SystemGenerated => "system_generated",
    ContentClaimed => "content_claimed",
    Uncertain => "uncertain",
});

str_enum!(DocumentKind {
    Notice => "notice",
    Procedural => "procedural",
    Contract => "contract",
    Invoice => "invoice",
    OrderExport => "order_export",
    ReviewCapture => "review_capture",
    LogisticsRecord => "logistics_record",
    Promotional => "promotional",
    Photo => "photo",
    Other => "other",
});

impl DocumentKind {
    /// Trade-like kinds are the only ones where amount/party fields are
    /// scored; everywhere else they are N/A.
    pub fn is_trade_like(&self) -> bool {
        matches!(self, Self::Contract | Self::Invoice | Self::OrderExport)
    }

    /// Procedural paperwork never contributes substantive time coverage.
    pub fn is_procedural(&self) -> bool {
        matches!(self, Self::Notice | Self::Procedural)
    }
}

str_enum!(SourceBucket {
    Fast => "fast",
    Full => "full",
    General => "general",
});

str_enum!(ScanMode {
    Fast => "fast",
    Full => "full",
    Mix => "mix",
});

str_enum!(CoverageLane {
    Substantive => "substantive",
    Reference => "reference",
});

str_enum!(FieldKind {
    Date => "date",
    Amount => "amount",
    Party => "party",
    Goods => "goods",
    MarkPresence => "mark_presence",
});

impl FieldKind {
    pub fn all() -> [FieldKind; 5] {
        [
            Self::Date,
            Self::Amount,
            Self::Party,
            Self::Goods,
            Self::MarkPresence,
        ]
    }
}

str_enum!(Validity {
    Valid => "valid",
    Invalid => "invalid",
    NotApplicable => "n/a",
});

str_enum!(GoodsMatch {
    Direct => "g1",
    Synonym => "g2",
    Unmatched => "g3",
    Missing => "missing",
});

impl GoodsMatch {
    /// Only direct and synonym tiers count as a goods hit.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Direct | Self::Synonym)
    }
}

str_enum!(TargetCode {
    T1 => "t1",
    T2 => "t2",
    T3 => "t3",
    T4 => "t4",
    T5 => "t5",
    T6 => "t6",
});

impl TargetCode {
    pub fn all() -> [TargetCode; 6] {
        [Self::T1, Self::T2, Self::T3, Self::T4, Self::T5, Self::T6]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::T1 => "using party",
            Self::T2 => "mark presence",
            Self::T3 => "goods/services",
            Self::T4 => "time of use",
            Self::T5 => "usage scene",
            Self::T6 => "commercial loop",
        }
    }
}

str_enum!(RiskLevel {
    A => "A",
    B => "B",
    C => "C",
    D => "D",
    E => "E",
});

impl RiskLevel {
    /// Fallback wording when the risk rules carry no decision text.
    pub fn default_decision(&self) -> &'static str {
        match self {
            Self::A => "ready to submit",
            Self::B => "submit (strengthening recommended)",
            Self::C => "strengthen before submitting",
            Self::D => "submit with caution (high risk)",
            Self::E => "hold submission",
        }
    }
}
