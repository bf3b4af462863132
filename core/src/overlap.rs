//! Per-query aggregations over the triples table.
//!
//! Groups are emitted in the order their query id first appears in the
//! triples table. Callers should not depend on that order.

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::index::{Corpus, DocId, QueryId, Triple};
use crate::summary::{mean, quantile_sorted, sample_std, sorted_f64};
use crate::tokenizer::token_set;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateCounts {
    pub query_id: QueryId,
    pub n_triples: usize,
    /// Distinct positive passages
    pub n_pos: usize,
    /// Distinct negative passages
    pub n_neg: usize,
    /// Passages labelled both positive and negative for this query
    pub n_shared: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapRow {
    pub query_id: QueryId,
    pub pos_doc_id: DocId,
    pub neg_doc_id: DocId,
    pub pos_overlap: f64,
    pub neg_overlap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Query,
    Positive,
    Negative,
}

/// A triple pointing at an id absent from the lookup maps. Not fatal: the
/// missing side is treated as having no tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingReference {
    pub triple_index: usize,
    pub kind: ReferenceKind,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapReport {
    pub rows: Vec<OverlapRow>,
    pub mean_pos_overlap: f64,
    pub mean_neg_overlap: f64,
    /// Rows whose negative shares some query tokens, and no fewer than the positive
    pub hard_negatives: usize,
    pub missing: Vec<MissingReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTripletCount {
    pub query_id: QueryId,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripletCounts {
    pub per_query: Vec<QueryTripletCount>,
    pub total: usize,
    pub queries: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: usize,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: usize,
}

/// Triples grouped by query id, groups in first-seen order.
pub(crate) fn group_by_query(triples: &[Triple]) -> Vec<(&str, Vec<&Triple>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Triple>)> = Vec::new();
    for t in triples {
        let slot = *slots.entry(t.query_id.as_str()).or_insert_with(|| {
            groups.push((t.query_id.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(t);
    }
    groups
}

pub fn candidate_counts(corpus: &Corpus) -> Vec<CandidateCounts> {
    group_by_query(corpus.triples())
        .into_iter()
        .map(|(qid, group)| {
            let pos: HashSet<&str> = group.iter().map(|t| t.doc_id_a.as_str()).collect();
            let neg: HashSet<&str> = group.iter().map(|t| t.doc_id_b.as_str()).collect();
            CandidateCounts {
                query_id: qid.to_owned(),
                n_triples: group.len(),
                n_pos: pos.len(),
                n_neg: neg.len(),
                n_shared: pos.intersection(&neg).count(),
            }
        })
        .collect()
}

/// `|query ∩ doc| / (|query| + ε)` on deduplicated tokens.
pub fn overlap_ratio(query: &HashSet<&str>, doc_tokens: &[String], epsilon: f64) -> f64 {
    let shared: HashSet<&str> = doc_tokens
        .iter()
        .map(String::as_str)
        .filter(|t| query.contains(t))
        .collect();
    shared.len() as f64 / (query.len() as f64 + epsilon)
}

pub fn overlap_stats(corpus: &Corpus, config: &AnalysisConfig) -> Result<OverlapReport> {
    let triples = corpus.triples();
    if triples.is_empty() {
        return Err(Error::EmptyInput("triples"));
    }
    let eps = config.overlap_epsilon;

    let mut query_sets: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut missing = Vec::new();
    let mut rows = Vec::with_capacity(triples.len());

    for (i, t) in triples.iter().enumerate() {
        let references = [
            (ReferenceKind::Query, corpus.query(&t.query_id).is_some(), &t.query_id),
            (ReferenceKind::Positive, corpus.document(&t.doc_id_a).is_some(), &t.doc_id_a),
            (ReferenceKind::Negative, corpus.document(&t.doc_id_b).is_some(), &t.doc_id_b),
        ];
        for (kind, found, id) in references {
            if !found {
                missing.push(MissingReference { triple_index: i, kind, id: id.clone() });
            }
        }

        let q = query_sets
            .entry(t.query_id.as_str())
            .or_insert_with(|| token_set(corpus.resolve_query_tokens(&t.query_id)));
        let pos = corpus.resolve_doc_tokens(&t.doc_id_a);
        let neg = corpus.resolve_doc_tokens(&t.doc_id_b);

        rows.push(OverlapRow {
            query_id: t.query_id.clone(),
            pos_doc_id: t.doc_id_a.clone(),
            neg_doc_id: t.doc_id_b.clone(),
            pos_overlap: overlap_ratio(q, pos, eps),
            neg_overlap: overlap_ratio(q, neg, eps),
        });
    }

    for m in &missing {
        tracing::debug!(triple = m.triple_index, kind = ?m.kind, id = %m.id, "missing reference");
    }
    if !missing.is_empty() {
        tracing::warn!(missing = missing.len(), triples = triples.len(), "triples reference unknown ids; treated as empty");
    }

    let pos: Vec<f64> = rows.iter().map(|r| r.pos_overlap).collect();
    let neg: Vec<f64> = rows.iter().map(|r| r.neg_overlap).collect();
    let hard_negatives = rows
        .iter()
        .filter(|r| r.neg_overlap > 0.0 && r.neg_overlap >= r.pos_overlap)
        .count();

    Ok(OverlapReport {
        mean_pos_overlap: mean(&pos).ok_or(Error::EmptyInput("triples"))?,
        mean_neg_overlap: mean(&neg).ok_or(Error::EmptyInput("triples"))?,
        rows,
        hard_negatives,
        missing,
    })
}

pub fn triplet_counts(corpus: &Corpus) -> Result<TripletCounts> {
    let per_query: Vec<QueryTripletCount> = group_by_query(corpus.triples())
        .into_iter()
        .map(|(qid, group)| QueryTripletCount { query_id: qid.to_owned(), count: group.len() })
        .collect();
    if per_query.is_empty() {
        return Err(Error::EmptyInput("triples"));
    }

    let sorted = sorted_f64(per_query.iter().map(|c| c.count));
    let quantile = |q| quantile_sorted(&sorted, q).ok_or(Error::EmptyInput("triples"));

    Ok(TripletCounts {
        total: per_query.iter().map(|c| c.count).sum(),
        queries: per_query.len(),
        mean: mean(&sorted).ok_or(Error::EmptyInput("triples"))?,
        std: sample_std(&sorted),
        min: per_query.iter().map(|c| c.count).min().unwrap_or(0),
        p25: quantile(0.25)?,
        median: quantile(0.5)?,
        p75: quantile(0.75)?,
        max: per_query.iter().map(|c| c.count).max().unwrap_or(0),
        per_query,
    })
}
