// src/lib.rs

//! Book Triage Library
//!
//! Decides whether each book in a collection should be sold, digitized, or
//! kept, from a handful of scores stored in a CSV file.

pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
