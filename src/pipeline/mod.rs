//! Pipeline entry points for book triage operations.
//!
//! - `run_scan`: Enrich records with missing data and recompute decisions
//! - `run_add`: Create a record from a title and ISBN
//! - `run_edit`: Apply a partial edit and recompute
//! - `run_info`: Summarize decisions and missing fields
//! - `run_create`: Write a new book file
//! - `run_validate`: Check configuration

pub mod add;
pub mod create;
pub mod edit;
pub mod info;
pub mod scan;
pub mod validate;

pub use add::{generate_id, run_add};
pub use create::{run_create, sample_records};
pub use edit::{RecordEdit, run_edit, should_reenrich};
pub use info::{CollectionInfo, collection_info, run_info};
pub use scan::{ScanSummary, needs_enrichment, run_scan};
pub use validate::run_validate;
