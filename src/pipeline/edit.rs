// src/pipeline/edit.rs

//! Edit pipeline: partial record changes.
//!
//! A record that still lacks a usable URL is looked up again once its human
//! scores and purchase price are in place.

use crate::error::{AppError, Result};
use crate::models::{BookRecord, ISBN_LENGTH, ScoreKind, is_valid_isbn};
use crate::services::{Enricher, enrich_record};
use crate::storage::BookStore;

/// Partial change to a record. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordEdit {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub primary_url: Option<String>,
    pub secondary_url: Option<String>,
    pub purchase_price: Option<f64>,
    pub used_price: Option<f64>,
    pub f: Option<i32>,
    pub r: Option<i32>,
    pub a: Option<i32>,
    pub v: Option<i32>,
    pub s: Option<i32>,
    pub p: Option<i32>,
}

impl RecordEdit {
    /// Score changes paired with their kind.
    pub fn scores(&self) -> [(ScoreKind, Option<i32>); 6] {
        [
            (ScoreKind::Frequency, self.f),
            (ScoreKind::Rarity, self.r),
            (ScoreKind::Annotation, self.a),
            (ScoreKind::Resale, self.v),
            (ScoreKind::Sentiment, self.s),
            (ScoreKind::Scannability, self.p),
        ]
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check ranges and formats before anything is written.
    pub fn validate(&self) -> Result<()> {
        for (kind, value) in self.scores() {
            if let Some(value) = value {
                if !kind.accepts(value) {
                    return Err(AppError::validation(format!(
                        "{kind} must be between {} and {}, got {value}",
                        kind.range().start(),
                        kind.range().end()
                    )));
                }
            }
        }
        for (name, price) in [
            ("purchase_price", self.purchase_price),
            ("used_price", self.used_price),
        ] {
            if let Some(price) = price {
                if !price.is_finite() || price < 0.0 {
                    return Err(AppError::validation(format!(
                        "{name} must be a non-negative amount, got {price}"
                    )));
                }
            }
        }
        if let Some(isbn) = &self.isbn {
            let isbn = isbn.trim();
            if !isbn.is_empty() && !is_valid_isbn(isbn) {
                return Err(AppError::validation(format!(
                    "ISBN must be exactly {ISBN_LENGTH} digits, got '{isbn}'"
                )));
            }
        }
        Ok(())
    }

    /// Write the set fields onto a record.
    pub fn apply_to(&self, record: &mut BookRecord) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        if let Some(isbn) = &self.isbn {
            record.isbn = isbn.trim().to_string();
        }
        if let Some(url) = &self.primary_url {
            record.primary_url = url.trim().to_string();
        }
        if let Some(url) = &self.secondary_url {
            record.secondary_url = url.trim().to_string();
        }
        if let Some(price) = self.purchase_price {
            record.purchase_price = price;
        }
        if let Some(price) = self.used_price {
            record.used_price = price;
        }
        for (kind, value) in self.scores() {
            if value.is_some() {
                *record.score_mut(kind) = value;
            }
        }
    }
}

/// A record is looked up again after an edit when it still has no usable
/// URL and the human scores plus a purchase price are in place.
pub fn should_reenrich(record: &BookRecord) -> bool {
    !record.has_usable_url()
        && record.f.is_some()
        && record.a.is_some()
        && record.s.is_some()
        && record.purchase_price > 0.0
}

/// Apply an edit to one record, re-enrich if needed, recompute, and save.
pub async fn run_edit(
    store: &mut BookStore,
    id: &str,
    edit: &RecordEdit,
    enricher: Option<&dyn Enricher>,
) -> Result<BookRecord> {
    edit.validate()?;

    let mut record = store
        .get_by_id(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;
    edit.apply_to(&mut record);

    if let Some(enricher) = enricher.filter(|_| should_reenrich(&record)) {
        if let Err(e) = enrich_record(enricher, &mut record).await {
            log::error!("Enrichment failed for record {}: {}", record.id, e);
        }
    }

    let record = store.replace(record)?;
    log::info!(
        "Updated record {}: decision {}, verified {}",
        record.id,
        record.decision,
        record.verified_label()
    );
    Ok(record)
}
