// src/pipeline/create.rs

//! Create pipeline: write a new book file, optionally with sample books.

use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::BookRecord;
use crate::storage::rows::encode_records;

/// Sample books written by `create --sample`.
pub fn sample_records() -> Vec<BookRecord> {
    let sample = |id: &str, title: &str, scores: [i32; 6]| {
        let [f, r, a, v, s, p] = scores;
        let mut record = BookRecord::new(id, title);
        record.f = Some(f);
        record.r = Some(r);
        record.a = Some(a);
        record.v = Some(v);
        record.s = Some(s);
        record.p = Some(p);
        record
    };

    vec![
        sample("sample1", "Sample Book 1", [3, 2, 1, 4, 2, 4]),
        sample("sample2", "Sample Book 2", [1, 4, 3, 2, 5, 2]),
    ]
}

/// Create a new book file with the full header, optionally with samples.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn run_create(path: &Path, sample: bool, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(AppError::config(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let records = if sample { sample_records() } else { Vec::new() };
    fs::write(path, encode_records(&records)?)?;

    log::info!("Created book file: {}", path.display());
    if sample {
        log::info!("Added {} sample records", records.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BookStore, COLUMNS};
    use tempfile::TempDir;

    #[test]
    fn test_create_header_only() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("books.csv");
        run_create(&path, false, false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), COLUMNS.join(","));
        assert!(BookStore::open(&path, 2).unwrap().is_empty());
    }

    #[test]
    fn test_create_with_samples() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        run_create(&path, true, false).unwrap();

        let store = BookStore::open(&path, 2).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_by_id("sample2").unwrap().s, Some(5));
    }

    #[test]
    fn test_create_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        fs::write(&path, "id,title\nb1,Keep me\n").unwrap();

        assert!(run_create(&path, false, false).is_err());
        run_create(&path, true, true).unwrap();
        assert!(BookStore::open(&path, 2).unwrap().get_by_id("b1").is_none());
    }
}
