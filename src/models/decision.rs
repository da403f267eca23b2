//! Triage decision values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Possible outcomes of triaging a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Sell,
    Digital,
    Keep,
    #[default]
    Unknown,
}

impl Decision {
    /// All values, in the order used for summaries.
    pub const ALL: [Decision; 4] = [
        Decision::Sell,
        Decision::Digital,
        Decision::Keep,
        Decision::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Sell => "sell",
            Decision::Digital => "digital",
            Decision::Keep => "keep",
            Decision::Unknown => "unknown",
        }
    }

    /// Lenient parse used when reading the backing file.
    ///
    /// Anything unrecognized maps to `Unknown`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sell" => Ok(Decision::Sell),
            "digital" => Ok(Decision::Digital),
            "keep" => Ok(Decision::Keep),
            "unknown" => Ok(Decision::Unknown),
            other => Err(format!("unrecognized decision '{other}'")),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
