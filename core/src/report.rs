use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::frequency::{TokenStats, TopTokens};
use crate::overlap::{CandidateCounts, OverlapReport, TripletCounts};
use crate::summary::Histogram;
use serde::Serialize;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Overrides `AnalysisConfig::top_k`
    pub top_k: Option<usize>,
    /// Keep the per-triple overlap rows in the report
    pub include_rows: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapSummary {
    pub triples: usize,
    pub mean_pos_overlap: f64,
    pub mean_neg_overlap: f64,
    pub hard_negatives: usize,
    pub missing_references: usize,
}

impl From<&OverlapReport> for OverlapSummary {
    fn from(r: &OverlapReport) -> Self {
        Self {
            triples: r.rows.len(),
            mean_pos_overlap: r.mean_pos_overlap,
            mean_neg_overlap: r.mean_neg_overlap,
            hard_negatives: r.hard_negatives,
            missing_references: r.missing.len(),
        }
    }
}

/// Distributions handed to the external plotting step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histograms {
    pub triplets_per_query: Histogram,
    pub document_lengths: Histogram,
    pub query_lengths: Histogram,
    pub pos_overlap: Histogram,
    pub neg_overlap: Histogram,
}

/// Everything one run computes. Plain data only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub generated_at: String,
    pub config: AnalysisConfig,
    pub triplet_counts: TripletCounts,
    pub token_stats: TokenStats,
    pub top_tokens: TopTokens,
    pub idf_scores: BTreeMap<String, f64>,
    pub overlap_summary: OverlapSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap: Option<OverlapReport>,
    pub candidates: Vec<CandidateCounts>,
    pub histograms: Histograms,
}

pub(crate) fn now_rfc3339() -> Result<String> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}
