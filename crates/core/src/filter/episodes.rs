//! Parsing of the free-text episode counters.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Numbers extracted from an episode counter such as `"Tập 5"`,
/// `"Hoàn Tất (12/12)"` or `"12 Tập"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeCount {
    /// The first number in the text, or the numerator of an `a/b` fraction.
    pub current: Option<u32>,
    /// The denominator of an `a/b` fraction.
    pub total: Option<u32>,
}

impl EpisodeCount {
    pub fn parse(text: &str) -> Self {
        if let Some(caps) = FRACTION.captures(text) {
            return Self {
                current: caps[1].parse().ok(),
                total: caps[2].parse().ok(),
            };
        }

        Self {
            current: NUMBER.find(text).and_then(|m| m.as_str().parse().ok()),
            total: None,
        }
    }
}
