// src/models/mod.rs

//! Domain models for the book triage application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod decision;
mod record;

// Re-export all public types
pub use config::{Config, EnrichmentConfig, LoggingConfig, MAX_SCAN_COST, StoreConfig};
pub use decision::Decision;
pub use record::{BookRecord, ISBN_LENGTH, ScoreKind, URL_UNKNOWN, is_usable_url, is_valid_isbn};
