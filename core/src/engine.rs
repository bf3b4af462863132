use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::frequency::{self, Side, SideStats, TokenStats, TopTokens};
use crate::idf;
use crate::index::{Corpus, Tables};
use crate::overlap::{self, CandidateCounts, OverlapReport, TripletCounts};
use crate::report::{AnalysisReport, Histograms, OverlapSummary, ReportOptions};
use crate::summary::Histogram;
use std::collections::BTreeMap;

/// Runs the dataset analyses over a loaded [`Corpus`].
///
/// Holds no mutable state: every method borrows the corpus and returns a
/// fresh value.
#[derive(Debug)]
pub struct DatasetAnalyzer {
    corpus: Corpus,
    config: AnalysisConfig,
}

impl DatasetAnalyzer {
    pub fn new(corpus: Corpus, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            documents = corpus.num_docs(),
            queries = corpus.queries().len(),
            triples = corpus.triples().len(),
            "analyzer ready"
        );
        Ok(Self { corpus, config })
    }

    pub fn from_tables(tables: Tables, config: AnalysisConfig) -> Result<Self> {
        Self::new(Corpus::from_tables(tables), config)
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }
    pub fn config(&self) -> &AnalysisConfig { &self.config }

    pub fn token_stats(&self) -> Result<TokenStats> {
        frequency::token_stats(&self.corpus)
    }

    pub fn side_stats(&self, side: Side) -> Result<SideStats> {
        frequency::side_stats(&self.corpus, side)
    }

    pub fn top_k_tokens(&self, k: usize) -> Result<TopTokens> {
        frequency::top_k_tokens(&self.corpus, k)
    }

    pub fn length_histogram(&self, side: Side) -> Result<Histogram> {
        frequency::length_histogram(&self.corpus, side, self.config.histogram_bins)
    }

    pub fn document_frequencies<S: AsRef<str>>(&self, tokens: &[S]) -> Result<BTreeMap<String, usize>> {
        idf::document_frequencies(&self.corpus, tokens)
    }

    pub fn idf_scores<S: AsRef<str>>(&self, tokens: &[S]) -> Result<BTreeMap<String, f64>> {
        idf::idf_scores(&self.corpus, tokens, &self.config)
    }

    pub fn candidate_counts(&self) -> Vec<CandidateCounts> {
        overlap::candidate_counts(&self.corpus)
    }

    pub fn overlap_stats(&self) -> Result<OverlapReport> {
        overlap::overlap_stats(&self.corpus, &self.config)
    }

    pub fn triplet_counts(&self) -> Result<TripletCounts> {
        overlap::triplet_counts(&self.corpus)
    }

    /// Run every analysis and collect the results.
    pub fn report(&self, opts: &ReportOptions) -> Result<AnalysisReport> {
        let top_k = opts.top_k.unwrap_or(self.config.top_k);
        let bins = self.config.histogram_bins;

        let triplet_counts = self.triplet_counts()?;
        let token_stats = self.token_stats()?;
        let top_tokens = self.top_k_tokens(top_k)?;
        let idf_tokens: Vec<&str> = top_tokens.queries.iter().map(|t| t.token.as_str()).collect();
        let idf_scores = self.idf_scores(&idf_tokens[..])?;
        let overlap = self.overlap_stats()?;
        let candidates = self.candidate_counts();

        let per_query: Vec<usize> = triplet_counts.per_query.iter().map(|c| c.count).collect();
        let pos: Vec<f64> = overlap.rows.iter().map(|r| r.pos_overlap).collect();
        let neg: Vec<f64> = overlap.rows.iter().map(|r| r.neg_overlap).collect();
        let histograms = Histograms {
            triplets_per_query: Histogram::from_counts(&per_query, bins),
            document_lengths: self.length_histogram(Side::Documents)?,
            query_lengths: self.length_histogram(Side::Queries)?,
            pos_overlap: Histogram::from_values(&pos, bins),
            neg_overlap: Histogram::from_values(&neg, bins),
        };

        tracing::info!(
            mean_pos_overlap = overlap.mean_pos_overlap,
            mean_neg_overlap = overlap.mean_neg_overlap,
            hard_negatives = overlap.hard_negatives,
            "analysis complete"
        );

        Ok(AnalysisReport {
            generated_at: crate::report::now_rfc3339()?,
            config: self.config.clone(),
            overlap_summary: OverlapSummary::from(&overlap),
            triplet_counts,
            token_stats,
            top_tokens,
            idf_scores,
            overlap: opts.include_rows.then_some(overlap),
            candidates,
            histograms,
        })
    }
}
