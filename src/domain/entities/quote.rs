//! Price catalogue entities: item codes, stored mappings and rendered quotes

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt;

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{3}$").expect("code pattern is valid")
});

/// A validated 3-digit item code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code(String);

impl Code {
    /// Validate raw input. Only exactly three ASCII digits are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        if CODE_PATTERN.is_match(raw) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The output triple stored for a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMapping {
    pub code: Code,
    pub normal_output: String,
    /// Selling price, shown to special users
    pub special_output1: String,
    /// Cost price, shown to special users
    pub special_output2: String,
}

impl OutputMapping {
    pub fn new(
        code: Code,
        normal_output: impl Into<String>,
        special_output1: impl Into<String>,
        special_output2: impl Into<String>,
    ) -> Self {
        Self {
            code,
            normal_output: normal_output.into(),
            special_output1: special_output1.into(),
            special_output2: special_output2.into(),
        }
    }
}

/// What a requester gets back for a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quote {
    Plain(String),
    Special { selling_price: String, cost_price: String },
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quote::Plain(text) => f.write_str(text),
            Quote::Special { selling_price, cost_price } => {
                write!(f, "Selling Price: {}\nCost Price: {}", selling_price, cost_price)
            }
        }
    }
}
