//! Book record data structure.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::Decision;

/// URL value meaning "looked up, not found".
///
/// An empty URL means the lookup was never attempted.
pub const URL_UNKNOWN: &str = "unknown";

/// Length of a valid ISBN-13.
pub const ISBN_LENGTH: usize = 13;

/// A tracked book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookRecord {
    /// Opaque unique identifier, assigned by whoever created the record
    pub id: String,

    /// Display title (may be empty)
    pub title: String,

    /// Empty or exactly 13 ASCII digits
    pub isbn: String,

    /// Primary marketplace link (stored in the `url` column)
    pub primary_url: String,

    /// Secondary marketplace link (stored in the `url_com` column)
    pub secondary_url: String,

    /// Purchase price, 0.0 when unknown
    pub purchase_price: f64,

    /// Used-market price, 0.0 when unknown
    pub used_price: f64,

    /// Frequency of use (1-5)
    pub f: Option<i32>,

    /// Annotation need (1-5)
    pub a: Option<i32>,

    /// Sentimental value (1-5)
    pub s: Option<i32>,

    /// Resale value (0-5), human override or derived from prices
    pub v: Option<i32>,

    /// Rarity (1-5)
    pub r: Option<i32>,

    /// Scannability, i.e. ease of digitizing (1-5)
    pub p: Option<i32>,

    /// Derived decision
    pub decision: Decision,

    /// Derived evidence flag
    pub verified: bool,

    /// Evidence supporting the rarity score
    pub citation_r: Vec<String>,

    /// Evidence supporting the scannability score
    pub citation_p: Vec<String>,
}

impl BookRecord {
    /// Create a fresh record with only an id and a title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            isbn: String::new(),
            primary_url: String::new(),
            secondary_url: String::new(),
            purchase_price: 0.0,
            used_price: 0.0,
            f: None,
            a: None,
            s: None,
            v: None,
            r: None,
            p: None,
            decision: Decision::Unknown,
            verified: false,
            citation_r: Vec::new(),
            citation_p: Vec::new(),
        }
    }

    /// Builder-style ISBN setter.
    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = isbn.into();
        self
    }

    /// Read a score by kind.
    pub fn score(&self, kind: ScoreKind) -> Option<i32> {
        match kind {
            ScoreKind::Frequency => self.f,
            ScoreKind::Annotation => self.a,
            ScoreKind::Sentiment => self.s,
            ScoreKind::Resale => self.v,
            ScoreKind::Rarity => self.r,
            ScoreKind::Scannability => self.p,
        }
    }

    /// Mutable access to a score slot by kind.
    pub fn score_mut(&mut self, kind: ScoreKind) -> &mut Option<i32> {
        match kind {
            ScoreKind::Frequency => &mut self.f,
            ScoreKind::Annotation => &mut self.a,
            ScoreKind::Sentiment => &mut self.s,
            ScoreKind::Resale => &mut self.v,
            ScoreKind::Rarity => &mut self.r,
            ScoreKind::Scannability => &mut self.p,
        }
    }

    /// True when at least one marketplace URL points somewhere.
    pub fn has_usable_url(&self) -> bool {
        is_usable_url(&self.primary_url) || is_usable_url(&self.secondary_url)
    }

    /// Label used for the `verified` column.
    pub fn verified_label(&self) -> &'static str {
        if self.verified { "yes" } else { "no" }
    }
}

/// A URL counts as usable when it is neither empty nor the sentinel.
pub fn is_usable_url(url: &str) -> bool {
    !url.is_empty() && url != URL_UNKNOWN
}

/// Check the ISBN format accepted from record creators.
pub fn is_valid_isbn(isbn: &str) -> bool {
    isbn.len() == ISBN_LENGTH && isbn.bytes().all(|b| b.is_ascii_digit())
}

/// The six scores tracked for each book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreKind {
    Frequency,
    Rarity,
    Annotation,
    Resale,
    Sentiment,
    Scannability,
}

impl ScoreKind {
    /// All kinds in column order.
    pub const ALL: [ScoreKind; 6] = [
        ScoreKind::Frequency,
        ScoreKind::Rarity,
        ScoreKind::Annotation,
        ScoreKind::Resale,
        ScoreKind::Sentiment,
        ScoreKind::Scannability,
    ];

    /// Column name in the backing file.
    pub fn column(&self) -> &'static str {
        match self {
            ScoreKind::Frequency => "F",
            ScoreKind::Rarity => "R",
            ScoreKind::Annotation => "A",
            ScoreKind::Resale => "V",
            ScoreKind::Sentiment => "S",
            ScoreKind::Scannability => "P",
        }
    }

    /// Valid values for this score.
    pub fn range(&self) -> RangeInclusive<i32> {
        match self {
            ScoreKind::Resale => 0..=5,
            _ => 1..=5,
        }
    }

    /// Check that `value` lies in this score's range.
    pub fn accepts(&self, value: i32) -> bool {
        self.range().contains(&value)
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
