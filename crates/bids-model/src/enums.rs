//! Type-safe enumerations for matching and mapping-table options.
//!
//! These are set from configuration files and CLI flags, so each one
//! round-trips through `FromStr`/`Display` and serde with the same
//! kebab-case spelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a raw identifier is located inside a folder or file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// The raw identifier may occur anywhere in the name.
    ///
    /// `"12"` qualifies for `"0123_Study"`, which is why ambiguous
    /// matches are reported rather than silently resolved.
    #[default]
    Substring,

    /// The raw identifier must occur delimited: the characters right
    /// before and after it are not ASCII letters or digits (or are the
    /// ends of the name). `"10"` does not qualify for `"sub-110-visit1"`.
    Token,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Substring => "substring",
            MatchStrategy::Token => "token",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" | "contains" => Ok(MatchStrategy::Substring),
            "token" | "exact-token" => Ok(MatchStrategy::Token),
            _ => Err(format!("Unknown match strategy: {s}")),
        }
    }
}

/// Which of the first two spreadsheet columns holds the raw identifier
/// when the table is read positionally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnOrder {
    /// Column A is the raw identifier, column B the anonymized one.
    #[default]
    RawFirst,

    /// Column A is the anonymized identifier, column B the raw one.
    AnonymizedFirst,
}

impl ColumnOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnOrder::RawFirst => "raw-first",
            ColumnOrder::AnonymizedFirst => "anonymized-first",
        }
    }

    /// Zero-based `(raw, anonymized)` column indices.
    pub fn indices(&self) -> (usize, usize) {
        match self {
            ColumnOrder::RawFirst => (0, 1),
            ColumnOrder::AnonymizedFirst => (1, 0),
        }
    }
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw-first" | "raw" => Ok(ColumnOrder::RawFirst),
            "anonymized-first" | "anonymized" | "anon-first" => Ok(ColumnOrder::AnonymizedFirst),
            _ => Err(format!("Unknown column order: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_strategy_from_str() {
        assert_eq!(
            "Substring".parse::<MatchStrategy>().unwrap(),
            MatchStrategy::Substring
        );
        assert_eq!(
            " token ".parse::<MatchStrategy>().unwrap(),
            MatchStrategy::Token
        );
        assert!("fuzzy".parse::<MatchStrategy>().is_err());
    }

    #[test]
    fn test_column_order_indices() {
        assert_eq!(ColumnOrder::RawFirst.indices(), (0, 1));
        assert_eq!(ColumnOrder::AnonymizedFirst.indices(), (1, 0));
        assert_eq!(
            "anonymized-first".parse::<ColumnOrder>().unwrap(),
            ColumnOrder::AnonymizedFirst
        );
    }

    #[test]
    fn test_display_matches_serde_spelling() {
        let json = serde_json::to_string(&ColumnOrder::AnonymizedFirst).unwrap();
        assert_eq!(json, format!("\"{}\"", ColumnOrder::AnonymizedFirst));
        let json = serde_json::to_string(&MatchStrategy::Token).unwrap();
        assert_eq!(json, format!("\"{}\"", MatchStrategy::Token));
    }
}
