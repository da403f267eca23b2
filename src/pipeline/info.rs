// src/pipeline/info.rs

//! Info pipeline: decision distribution and missing fields.

use std::collections::BTreeMap;

use crate::models::{BookRecord, Decision, ScoreKind};
use crate::storage::BookStore;

/// Overview of a collection.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectionInfo {
    pub total: usize,
    pub decisions: BTreeMap<Decision, usize>,
    /// Field name to number of records where it is missing
    pub missing: BTreeMap<&'static str, usize>,
}

/// Count decisions and missing fields.
pub fn collection_info(records: &[BookRecord]) -> CollectionInfo {
    let mut info = CollectionInfo {
        total: records.len(),
        ..CollectionInfo::default()
    };

    for record in records {
        *info.decisions.entry(record.decision).or_default() += 1;

        if record.primary_url.is_empty() {
            *info.missing.entry("url").or_default() += 1;
        }
        for kind in ScoreKind::ALL {
            if record.score(kind).is_none() {
                *info.missing.entry(kind.column()).or_default() += 1;
            }
        }
    }

    info
}

/// Log an overview of the store.
pub fn run_info(store: &BookStore) -> CollectionInfo {
    let info = collection_info(store.records());

    log::info!("Book file: {}", store.path().display());
    log::info!("Total records: {}", info.total);
    if info.total == 0 {
        return info;
    }

    log::info!("Decision distribution:");
    for (decision, count) in &info.decisions {
        log::info!("  {}: {} books", decision, count);
    }
    if !info.missing.is_empty() {
        log::info!("Missing fields:");
        for (field, count) in &info.missing {
            log::info!("  {}: {} books", field, count);
        }
    }

    info
}
