//! Descriptive statistics over a query / passage / triple ranking dataset.
//!
//! Build a [`Corpus`] from the three tables, wrap it in a [`DatasetAnalyzer`]
//! and call the analyses you need; each returns plain data.

pub mod config;
pub mod engine;
pub mod error;
pub mod frequency;
pub mod idf;
pub mod index;
pub mod overlap;
pub mod persist;
pub mod report;
pub mod sink;
pub mod summary;
pub mod tokenizer;

pub use config::AnalysisConfig;
pub use engine::DatasetAnalyzer;
pub use error::{Error, Result};
pub use frequency::{Side, SideStats, TokenCount, TokenStats, TopTokens};
pub use index::{Corpus, DocId, Document, DocumentRecord, Query, QueryId, QueryRecord, Tables, Triple};
pub use overlap::{
    CandidateCounts, MissingReference, OverlapReport, OverlapRow, QueryTripletCount, ReferenceKind, TripletCounts,
};
pub use report::{AnalysisReport, ReportOptions};
pub use summary::Histogram;
