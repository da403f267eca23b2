//! Storage for the book collection.
//!
//! The collection lives in a single CSV file:
//!
//! ```text
//! id,title,url,url_com,purchase_price,used_price,F,R,A,V,S,P,decision,verified,isbn,citation_R,citation_P
//! a1b2c3d4,Dune,https://...,unknown,1200.0,300.0,4,2,1,2,3,4,digital,yes,9784000000000,"[""...""]","[""...""]"
//! ```
//!
//! Columns are matched by header name on read, so older files with fewer
//! columns still load. Citation cells hold JSON arrays of strings.

pub mod local;
pub mod rows;

// Re-export for convenience
pub use local::BookStore;
pub use rows::COLUMNS;
