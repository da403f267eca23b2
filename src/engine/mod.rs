//! Decision engine.
//!
//! - `valuation`: resale score derived from the price ratio
//! - `decision`: utilities, winner selection, and the verified flag

pub mod decision;
pub mod valuation;

pub use decision::{Assessment, Utilities, effective_resale_value, is_verified, recompute};
pub use valuation::{resale_value, score_for_ratio};
