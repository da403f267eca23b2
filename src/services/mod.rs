//! Service layer for the book triage application.
//!
//! This module contains the collaborators that reach outside the process:
//! - Marketplace lookup (`Enricher`, `OpenAiEnricher`)

mod enrichment;

pub use enrichment::{Enricher, Enrichment, LookupQuery, OpenAiEnricher, enrich_record};
