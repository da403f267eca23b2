//! Local filesystem book store.
//!
//! Owns the ordered record collection and the CSV file behind it. Every
//! mutation rewrites the whole file (write to temp, then rename), so a
//! failed save leaves the previous file in place.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::{resale_value, recompute};
use crate::error::{AppError, Result};
use crate::models::BookRecord;
use crate::storage::rows::{encode_records, read_records};

/// CSV-backed collection of book records.
///
/// Records keep insertion order; lookup by id goes through an index.
#[derive(Debug)]
pub struct BookStore {
    path: PathBuf,
    scan_cost: u32,
    records: Vec<BookRecord>,
    index: HashMap<String, usize>,
}

impl BookStore {
    /// Open the store at `path`, loading existing data if the file exists.
    pub fn open(path: impl Into<PathBuf>, scan_cost: u32) -> Result<Self> {
        let mut store = Self {
            path: path.into(),
            scan_cost,
            records: Vec::new(),
            index: HashMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Digitization cost used by the decision engine.
    pub fn scan_cost(&self) -> u32 {
        self.scan_cost
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-read the backing file, replacing the in-memory collection.
    ///
    /// When both prices are known, V is re-derived from them and any stored
    /// V is discarded, including one entered by hand. `decision` and
    /// `verified` are kept as stored, so a row whose V changed carries a
    /// stale decision until `recompute_all` or the next mutation of it.
    pub fn load(&mut self) -> Result<()> {
        let Some(bytes) = self.read_bytes()? else {
            log::info!(
                "Book file {} does not exist. Will create new file.",
                self.path.display()
            );
            self.records.clear();
            self.index.clear();
            return Ok(());
        };

        let mut records = read_records(&bytes, &self.path)?;
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter_mut().enumerate() {
            if let Some(v) = resale_value(record.purchase_price, record.used_price) {
                if record.v.is_some_and(|stored| stored != v) {
                    log::debug!(
                        "Record {}: stored V {:?} replaced by price-derived {}",
                        record.id,
                        record.v,
                        v
                    );
                }
                record.v = Some(v);
            }
            if index.insert(record.id.clone(), position).is_some() {
                return Err(AppError::parse(
                    &self.path,
                    format!("duplicate id '{}'", record.id),
                ));
            }
        }

        self.records = records;
        self.index = index;
        log::info!(
            "Loaded {} records from {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Write the whole collection back to the backing file.
    ///
    /// An empty collection is not written, so an existing file is never
    /// truncated to a bare header.
    pub fn save(&self) -> Result<()> {
        if self.records.is_empty() {
            log::warn!("No records to save");
            return Ok(());
        }

        let bytes = encode_records(&self.records)?;
        self.write_bytes(&bytes)?;
        log::info!(
            "Saved {} records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Append a record, compute its decision, and persist.
    ///
    /// Fails on a duplicate id. If the save fails the record is dropped
    /// again, so memory matches disk.
    pub fn add(&mut self, mut record: BookRecord) -> Result<()> {
        if self.index.contains_key(&record.id) {
            return Err(AppError::DuplicateId(record.id));
        }
        recompute(&record, self.scan_cost).apply_to(&mut record);

        let id = record.id.clone();
        self.index.insert(id.clone(), self.records.len());
        self.records.push(record);

        if let Err(e) = self.save() {
            self.records.pop();
            self.index.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    /// Copy of every record, in insertion order.
    pub fn get_all(&self) -> Vec<BookRecord> {
        self.records.clone()
    }

    /// Borrowed view of every record, in insertion order.
    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    /// Find a record by id.
    pub fn get_by_id(&self, id: &str) -> Option<&BookRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    /// Replace a stored record with `record` (matched by id), recompute its
    /// decision, and persist.
    ///
    /// Returns the stored copy. Unknown ids fail with `NotFound`.
    pub fn replace(&mut self, mut record: BookRecord) -> Result<BookRecord> {
        let position = *self
            .index
            .get(&record.id)
            .ok_or_else(|| AppError::NotFound(record.id.clone()))?;

        recompute(&record, self.scan_cost).apply_to(&mut record);
        let previous = std::mem::replace(&mut self.records[position], record);

        if let Err(e) = self.save() {
            self.records[position] = previous;
            return Err(e);
        }
        Ok(self.records[position].clone())
    }

    /// Edit one record in place, recompute its decision, and persist.
    ///
    /// Returns `None` when no record has this id.
    pub fn update<F>(&mut self, id: &str, edit: F) -> Result<Option<BookRecord>>
    where
        F: FnOnce(&mut BookRecord),
    {
        let Some(mut record) = self.get_by_id(id).cloned() else {
            return Ok(None);
        };
        edit(&mut record);
        record.id = id.to_string();
        self.replace(record).map(Some)
    }

    /// Edit every record, recompute all decisions, and persist once.
    pub fn update_all<F>(&mut self, mut edit: F) -> Result<()>
    where
        F: FnMut(&mut BookRecord),
    {
        let previous = self.records.clone();
        for record in &mut self.records {
            let id = record.id.clone();
            edit(record);
            record.id = id;
            recompute(record, self.scan_cost).apply_to(record);
        }

        if let Err(e) = self.save() {
            self.records = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Recompute every decision and persist.
    pub fn recompute_all(&mut self) -> Result<()> {
        self.update_all(|_| {})
    }

    /// Read the backing file, returning None if it doesn't exist.
    fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(&self.path);
        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(AppError::Io(e));
        }
        Ok(())
    }
}

/// Sibling temp file, e.g. `books.csv` -> `books.csv.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;
    use tempfile::TempDir;

    fn scored(id: &str, f: i32, r: i32, a: i32, s: i32, p: i32) -> BookRecord {
        let mut record = BookRecord::new(id, format!("Book {id}"));
        record.f = Some(f);
        record.r = Some(r);
        record.a = Some(a);
        record.s = Some(s);
        record.p = Some(p);
        record
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        assert!(store.is_empty());
        assert!(!tmp.path().join("books.csv").exists());
    }

    #[test]
    fn test_add_persists_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        let mut store = BookStore::open(&path, 2).unwrap();

        store.add(BookRecord::new("b1", "First")).unwrap();
        store.add(BookRecord::new("b2", "Second")).unwrap();
        store.add(BookRecord::new("b3", "Third")).unwrap();

        let reopened = BookStore::open(&path, 2).unwrap();
        let ids: Vec<_> = reopened.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b1", "b2", "b3"]);
        assert_eq!(reopened.get_by_id("b2").unwrap().title, "Second");
        assert!(reopened.get_by_id("missing").is_none());
    }

    #[test]
    fn test_add_computes_decision() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        let mut store = BookStore::open(&path, 2).unwrap();

        let mut record = scored("b1", 4, 2, 1, 1, 4);
        record.v = Some(2);
        record.citation_r = vec!["Few copies".to_string()];
        record.citation_p = vec!["Paperback".to_string()];
        record.primary_url = "https://www.amazon.co.jp/dp/4000000000".to_string();
        store.add(record).unwrap();

        let stored = store.get_by_id("b1").unwrap();
        assert_eq!(stored.decision, Decision::Digital);
        assert!(stored.verified);

        let reopened = BookStore::open(&path, 2).unwrap();
        let saved = reopened.get_by_id("b1").unwrap();
        assert_eq!(saved.decision, Decision::Digital);
        assert!(saved.verified);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        store.add(BookRecord::new("b1", "First")).unwrap();

        let err = store.add(BookRecord::new("b1", "Again")).unwrap_err();
        assert!(matches!(err, AppError::DuplicateId(id) if id == "b1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_id_in_file_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        fs::write(&path, "id,title\nb1,One\nb1,Two\n").unwrap();
        assert!(matches!(
            BookStore::open(&path, 2),
            Err(AppError::Parse { .. })
        ));
    }

    #[test]
    fn test_malformed_file_fails_open() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        fs::write(&path, "id,title,F\nb1,One,3\nb2\"broken,Two,\n,,,,\n").unwrap();
        assert!(BookStore::open(&path, 2).is_err());
    }

    #[test]
    fn test_get_all_is_a_copy() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        store.add(BookRecord::new("b1", "Original")).unwrap();

        let mut copy = store.get_all();
        copy[0].title = "Changed".to_string();
        assert_eq!(store.get_by_id("b1").unwrap().title, "Original");
    }

    #[test]
    fn test_empty_save_does_not_truncate() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        fs::write(&path, "id,title\n").unwrap();

        let store = BookStore::open(&path, 2).unwrap();
        assert!(store.is_empty());
        store.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,title\n");
    }

    #[test]
    fn test_failed_save_keeps_memory_consistent() {
        let tmp = TempDir::new().unwrap();
        // The backing path is a directory, so the final rename fails.
        let path = tmp.path().join("books.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "x").unwrap();

        let mut store = BookStore {
            path: path.clone(),
            scan_cost: 2,
            records: Vec::new(),
            index: HashMap::new(),
        };
        assert!(store.add(BookRecord::new("b1", "First")).is_err());
        assert!(store.is_empty());
        assert!(store.get_by_id("b1").is_none());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_update_recomputes_and_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        let mut store = BookStore::open(&path, 2).unwrap();
        store.add(BookRecord::new("b1", "Book")).unwrap();

        let updated = store
            .update("b1", |record| {
                record.f = Some(4);
                record.r = Some(2);
                record.a = Some(1);
                record.v = Some(2);
                record.s = Some(1);
                record.p = Some(4);
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.decision, Decision::Digital);

        let reopened = BookStore::open(&path, 2).unwrap();
        assert_eq!(reopened.get_by_id("b1").unwrap().decision, Decision::Digital);
        assert!(store.update("nope", |_| {}).unwrap().is_none());
    }

    #[test]
    fn test_update_cannot_change_id() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        store.add(BookRecord::new("b1", "Book")).unwrap();

        store
            .update("b1", |record| record.id = "other".to_string())
            .unwrap();
        assert!(store.get_by_id("b1").is_some());
        assert!(store.get_by_id("other").is_none());
    }

    #[test]
    fn test_replace_unknown_id() {
        let tmp = TempDir::new().unwrap();
        let mut store = BookStore::open(tmp.path().join("books.csv"), 2).unwrap();
        let err = store.replace(BookRecord::new("ghost", "Ghost")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_recompute_all_uses_scan_cost() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        let mut store = BookStore::open(&path, 0).unwrap();
        store.add(scored("b1", 3, 1, 1, 1, 3)).unwrap();
        store.recompute_all().unwrap();
        // digital 6 vs keep 3
        assert_eq!(store.get_by_id("b1").unwrap().decision, Decision::Digital);

        let mut costly = BookStore::open(&path, 5).unwrap();
        costly.recompute_all().unwrap();
        // digital 1 vs keep 3
        assert_eq!(costly.get_by_id("b1").unwrap().decision, Decision::Keep);
    }

    #[test]
    fn test_load_rederives_v_from_prices() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        fs::write(
            &path,
            "id,title,purchase_price,used_price,F,R,A,V,S,P,decision\n\
             test1,Test Book,1000,50,3,2,1,5,2,4,unknown\n\
             test2,Test Book 2,1000,200,3,2,1,,2,4,unknown\n\
             test3,Test Book 3,1000,350,3,2,1,,2,4,unknown\n\
             test4,Test Book 4,1000,500,3,2,1,,2,4,unknown\n\
             test5,Test Book 5,1000,700,3,2,1,,2,4,unknown\n\
             test6,Test Book 6,1000,900,3,2,1,,2,4,unknown\n\
             test7,No Prices,0,900,3,2,1,4,2,4,unknown\n",
        )
        .unwrap();

        let store = BookStore::open(&path, 2).unwrap();
        let v: Vec<_> = store.records().iter().map(|r| r.v).collect();
        assert_eq!(
            v,
            [Some(0), Some(1), Some(2), Some(3), Some(4), Some(5), Some(4)]
        );
    }

    #[test]
    fn test_reload_discards_hand_entered_v() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        let mut store = BookStore::open(&path, 2).unwrap();

        let mut record = BookRecord::new("b1", "Priced");
        record.purchase_price = 1000.0;
        record.used_price = 900.0;
        record.v = Some(1);
        store.add(record).unwrap();
        assert_eq!(store.get_by_id("b1").unwrap().v, Some(1));

        store.load().unwrap();
        assert_eq!(store.get_by_id("b1").unwrap().v, Some(5));
    }

    #[test]
    fn test_reload_keeps_stored_decision_until_recompute() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.csv");
        let mut store = BookStore::open(&path, 2).unwrap();

        let mut record = BookRecord::new("b1", "Cheap Reprint");
        record.purchase_price = 1000.0;
        record.used_price = 50.0;
        record.v = Some(5);
        store.add(record).unwrap();
        assert_eq!(store.get_by_id("b1").unwrap().decision, Decision::Sell);

        store.load().unwrap();
        let reloaded = store.get_by_id("b1").unwrap();
        assert_eq!(reloaded.v, Some(0));
        assert_eq!(reloaded.decision, Decision::Sell);

        store.recompute_all().unwrap();
        assert_eq!(store.get_by_id("b1").unwrap().decision, Decision::Unknown);
    }

    #[test]
    fn test_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("books.csv");
        let mut store = BookStore::open(&path, 2).unwrap();

        let mut full = scored("b1", 4, 2, 1, 1, 4);
        full.v = Some(2);
        full.isbn = "9784000000000".to_string();
        full.primary_url = "https://www.amazon.co.jp/dp/4000000000".to_string();
        full.secondary_url = "unknown".to_string();
        full.citation_r = vec!["Out of print since 1999".to_string()];
        full.citation_p = vec!["Standard paperback binding".to_string()];
        store.add(full).unwrap();
        store.add(BookRecord::new("b2", "")).unwrap();
        store.recompute_all().unwrap();

        let before = store.get_all();
        store.load().unwrap();
        assert_eq!(store.get_all(), before);
        assert_eq!(before[0].decision, Decision::Digital);
        assert!(before[0].verified);
    }
}
