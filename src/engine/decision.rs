//! Utility scoring and decision selection.
//!
//! Utilities are integers computed from the six scores, with unset scores
//! counted as zero:
//!
//! - `sell    = V - (R + S)`
//! - `digital = F + P - scan_cost`
//! - `keep    = R + A + S`
//!
//! Candidates are compared in the order sell, digital, keep and the first
//! maximal one wins. A maximum of zero or less yields `unknown`.

use serde::Serialize;

use crate::engine::valuation::resale_value;
use crate::models::{BookRecord, Decision};

/// Per-candidate utility scores for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Utilities {
    pub sell: i64,
    pub digital: i64,
    pub keep: i64,
}

impl Utilities {
    /// Compute utilities for a record.
    ///
    /// An unset V falls back to the price-derived value when both prices
    /// are known. Sums are taken in `i64`, so scores read from disk outside
    /// their range cannot overflow.
    pub fn compute(record: &BookRecord, scan_cost: u32) -> Self {
        let score = |value: Option<i32>| i64::from(value.unwrap_or(0));
        let v = score(effective_resale_value(record));
        let (f, a, s, r, p) = (
            score(record.f),
            score(record.a),
            score(record.s),
            score(record.r),
            score(record.p),
        );
        let scan_cost = i64::from(scan_cost);

        Self {
            sell: v - (r + s),
            digital: f + p - scan_cost,
            keep: r + a + s,
        }
    }

    /// Candidates in tie-break order.
    pub fn candidates(&self) -> [(Decision, i64); 3] {
        [
            (Decision::Sell, self.sell),
            (Decision::Digital, self.digital),
            (Decision::Keep, self.keep),
        ]
    }

    /// Pick the winning decision.
    pub fn decide(&self) -> Decision {
        let mut best = (Decision::Unknown, i64::MIN);
        for (decision, utility) in self.candidates() {
            if utility > best.1 {
                best = (decision, utility);
            }
        }
        if best.1 <= 0 {
            Decision::Unknown
        } else {
            best.0
        }
    }
}

/// Evidence check: both citation lists filled and a usable marketplace URL.
pub fn is_verified(record: &BookRecord) -> bool {
    !record.citation_r.is_empty() && !record.citation_p.is_empty() && record.has_usable_url()
}

/// The V the engine uses: the stored value, else the price-derived one.
pub fn effective_resale_value(record: &BookRecord) -> Option<i32> {
    record
        .v
        .or_else(|| resale_value(record.purchase_price, record.used_price))
}

/// Everything the engine derives for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub utilities: Utilities,
    pub decision: Decision,
    pub verified: bool,
    /// V used for the computation, if any
    pub resale_value: Option<i32>,
}

impl Assessment {
    /// Write the derived fields back onto the record.
    ///
    /// An unset V is filled with the price-derived value; a human-set V is
    /// left alone.
    pub fn apply_to(&self, record: &mut BookRecord) {
        record.decision = self.decision;
        record.verified = self.verified;
        if record.v.is_none() {
            record.v = self.resale_value;
        }
    }
}

/// Derive decision and verification for a record without touching it.
pub fn recompute(record: &BookRecord, scan_cost: u32) -> Assessment {
    let utilities = Utilities::compute(record, scan_cost);
    Assessment {
        utilities,
        decision: utilities.decide(),
        verified: is_verified(record),
        resale_value: effective_resale_value(record),
    }
}
