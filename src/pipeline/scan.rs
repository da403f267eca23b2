// src/pipeline/scan.rs

//! Scan pipeline: enrich records that are missing data, then recompute
//! every decision and save once.

use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::models::{BookRecord, Decision};
use crate::services::{Enricher, Enrichment, LookupQuery};
use crate::storage::BookStore;

/// Summary of a scan run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub records: usize,
    pub enriched: usize,
    /// Lookups that succeeded but returned no usable data
    pub empty_replies: usize,
    pub enrichment_failures: usize,
    pub decisions: BTreeMap<Decision, usize>,
}

/// A record is looked up when it has no primary URL or no resale score.
pub fn needs_enrichment(record: &BookRecord) -> bool {
    record.primary_url.is_empty() || record.v.is_none()
}

/// Enrich records that are missing data, then recompute every decision.
///
/// Lookups run one at a time and a failed lookup only skips that record.
/// The store is written once at the end.
pub async fn run_scan(store: &mut BookStore, enricher: Option<&dyn Enricher>) -> Result<ScanSummary> {
    let mut summary = ScanSummary {
        records: store.len(),
        ..ScanSummary::default()
    };

    if store.is_empty() {
        log::warn!("No records found. Add some books first.");
        return Ok(summary);
    }

    log::info!(
        "Starting scan for {} records (scan cost {})",
        store.len(),
        store.scan_cost()
    );

    let mut found: HashMap<String, Enrichment> = HashMap::new();
    if let Some(enricher) = enricher {
        for record in store.records().iter().filter(|r| needs_enrichment(r)) {
            let Some(query) = LookupQuery::for_record(record) else {
                log::warn!(
                    "No title or valid ISBN for record {}, skipping enrichment",
                    record.id
                );
                continue;
            };

            log::debug!("Looking up record {} ({})", record.id, query.describe());
            match enricher.lookup(&query).await {
                Ok(enrichment) if enrichment.is_empty() => {
                    summary.empty_replies += 1;
                    log::warn!("Lookup for record {} returned no data", record.id);
                }
                Ok(enrichment) => {
                    summary.enriched += 1;
                    found.insert(record.id.clone(), enrichment);
                }
                Err(e) => {
                    summary.enrichment_failures += 1;
                    log::error!("Enrichment failed for record {}: {}", record.id, e);
                }
            }
        }
    }

    store.update_all(|record| {
        if let Some(enrichment) = found.remove(&record.id) {
            enrichment.apply_to(record);
        }
    })?;

    for record in store.records() {
        *summary.decisions.entry(record.decision).or_default() += 1;
    }

    log::info!("Scan completed");
    for (decision, count) in &summary.decisions {
        log::info!("  {}: {} books", decision, count);
    }
    if summary.empty_replies > 0 {
        log::warn!("{} lookups returned no data", summary.empty_replies);
    }
    if summary.enrichment_failures > 0 {
        log::warn!("{} lookups failed", summary.enrichment_failures);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::URL_UNKNOWN;
    use crate::pipeline::testing::FakeEnricher;
    use tempfile::TempDir;

    fn record(id: &str, title: &str) -> BookRecord {
        let mut record = BookRecord::new(id, title);
        record.f = Some(4);
        record.r = Some(2);
        record.a = Some(1);
        record.s = Some(1);
        record.p = Some(4);
        record
    }

    #[tokio::test]
    async fn test_scan_empty_store() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        let summary = run_scan(&mut store, None).await.unwrap();
        assert_eq!(summary.records, 0);
        assert!(!tmp.path().join("books.csv").exists());
    }

    #[tokio::test]
    async fn test_scan_offline_recomputes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        let mut store = BookStore::open(&path, 2).unwrap();
        store.add(record("b1", "Dune")).unwrap();
        store.add(BookRecord::new("b2", "Blank")).unwrap();

        let summary = run_scan(&mut store, None).await.unwrap();
        assert_eq!(summary.enriched, 0);
        assert_eq!(summary.decisions.get(&Decision::Digital), Some(&1));
        assert_eq!(summary.decisions.get(&Decision::Unknown), Some(&1));

        let reopened = BookStore::open(&path, 2).unwrap();
        assert_eq!(reopened.get_by_id("b1").unwrap().decision, Decision::Digital);
    }

    #[tokio::test]
    async fn test_scan_enriches_missing_data_only() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();

        let mut complete = record("b1", "Complete");
        complete.primary_url = "https://www.amazon.co.jp/dp/4000000001".to_string();
        complete.v = Some(2);
        store.add(complete).unwrap();
        store.add(record("b2", "Needs Lookup")).unwrap();
        store.add(record("b3", "")).unwrap();

        let enricher = FakeEnricher::verified();
        let summary = run_scan(&mut store, Some(&enricher)).await.unwrap();

        assert_eq!(summary.enriched, 1);
        assert_eq!(enricher.calls(), 1);
        let b2 = store.get_by_id("b2").unwrap();
        assert!(b2.verified);
        assert_eq!(b2.secondary_url, URL_UNKNOWN);
        assert!(!store.get_by_id("b1").unwrap().verified);
    }

    #[tokio::test]
    async fn test_scan_survives_lookup_failure() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        store.add(record("b1", "Dune")).unwrap();

        let enricher = FakeEnricher::failing();
        let summary = run_scan(&mut store, Some(&enricher)).await.unwrap();

        assert_eq!(summary.enrichment_failures, 1);
        assert_eq!(store.get_by_id("b1").unwrap().decision, Decision::Digital);
    }

    #[tokio::test]
    async fn test_empty_reply_is_not_counted_as_enriched() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        store.add(record("b1", "Dune")).unwrap();

        let enricher = FakeEnricher::empty();
        let summary = run_scan(&mut store, Some(&enricher)).await.unwrap();

        assert_eq!(enricher.calls(), 1);
        assert_eq!(summary.enriched, 0);
        assert_eq!(summary.empty_replies, 1);
        assert_eq!(summary.enrichment_failures, 0);
        let b1 = store.get_by_id("b1").unwrap();
        assert!(b1.primary_url.is_empty());
        assert!(!b1.verified);
    }
}
