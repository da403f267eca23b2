// src/pipeline/add.rs

//! Add pipeline: create a record from a title and ISBN.

use uuid::Uuid;

use crate::engine::recompute;
use crate::error::{AppError, Result};
use crate::models::{BookRecord, ISBN_LENGTH, is_valid_isbn};
use crate::services::{Enricher, enrich_record};
use crate::storage::BookStore;

/// Length of generated record ids.
const ID_LENGTH: usize = 8;

/// Generate a short id not yet used in the store.
pub fn generate_id(store: &BookStore) -> String {
    loop {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LENGTH);
        if store.get_by_id(&id).is_none() {
            return id;
        }
    }
}

/// Create a record from a title and optional ISBN and add it to the store.
///
/// The ISBN must be empty or exactly 13 digits. A failed lookup is logged
/// and the record is added without it.
pub async fn run_add(
    store: &mut BookStore,
    title: &str,
    isbn: &str,
    enricher: Option<&dyn Enricher>,
) -> Result<BookRecord> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    let isbn = isbn.trim();
    if !isbn.is_empty() && !is_valid_isbn(isbn) {
        return Err(AppError::validation(format!(
            "ISBN must be exactly {ISBN_LENGTH} digits, got '{isbn}'"
        )));
    }

    let mut record = BookRecord::new(generate_id(store), title).with_isbn(isbn);

    if let Some(enricher) = enricher {
        if let Err(e) = enrich_record(enricher, &mut record).await {
            log::error!("Enrichment failed for record {}: {}", record.id, e);
        }
    }

    recompute(&record, store.scan_cost()).apply_to(&mut record);
    store.add(record.clone())?;
    log::info!("Added record {} ({})", record.id, record.title);
    Ok(record)
}
