use crate::error::{Error, Result};
use crate::index::Corpus;
use crate::summary::{quantile_sorted, sorted_f64, Histogram};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Which table a token statistic is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Documents,
    Queries,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Documents => "documents",
            Side::Queries => "queries",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideStats {
    pub records: usize,
    pub total_tokens: usize,
    pub unique_tokens: usize,
    pub mean_length: f64,
    pub median_length: f64,
    pub min_length: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenStats {
    pub documents: SideStats,
    pub queries: SideStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCount {
    pub token: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopTokens {
    pub documents: Vec<TokenCount>,
    pub queries: Vec<TokenCount>,
}

pub(crate) fn sequences(corpus: &Corpus, side: Side) -> Vec<&[String]> {
    match side {
        Side::Documents => corpus.documents().iter().map(|d| d.tokens.as_slice()).collect(),
        Side::Queries => corpus.queries().iter().map(|q| q.tokens.as_slice()).collect(),
    }
}

pub fn side_stats(corpus: &Corpus, side: Side) -> Result<SideStats> {
    let seqs = sequences(corpus, side);
    if seqs.is_empty() {
        return Err(Error::EmptyInput(side.as_str()));
    }
    let total_tokens: usize = seqs.iter().map(|s| s.len()).sum();
    let unique_tokens = seqs
        .iter()
        .flat_map(|s| s.iter().map(String::as_str))
        .collect::<HashSet<&str>>()
        .len();
    let lengths = sorted_f64(seqs.iter().map(|s| s.len()));
    let median_length = quantile_sorted(&lengths, 0.5).ok_or(Error::EmptyInput(side.as_str()))?;

    Ok(SideStats {
        records: seqs.len(),
        total_tokens,
        unique_tokens,
        mean_length: total_tokens as f64 / seqs.len() as f64,
        median_length,
        min_length: seqs.iter().map(|s| s.len()).min().unwrap_or(0),
        max_length: seqs.iter().map(|s| s.len()).max().unwrap_or(0),
    })
}

pub fn token_stats(corpus: &Corpus) -> Result<TokenStats> {
    Ok(TokenStats {
        documents: side_stats(corpus, Side::Documents)?,
        queries: side_stats(corpus, Side::Queries)?,
    })
}

/// Most frequent tokens of one table, ties kept in first-seen order.
pub fn top_k_side(corpus: &Corpus, side: Side, k: usize) -> Result<Vec<TokenCount>> {
    if k == 0 {
        return Err(Error::invalid_argument("k must be a positive integer"));
    }
    let seqs = sequences(corpus, side);
    if seqs.is_empty() {
        return Err(Error::EmptyInput(side.as_str()));
    }

    // token -> (count, first-seen rank)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for token in seqs.iter().flat_map(|s| s.iter()) {
        let rank = counts.len();
        counts.entry(token.as_str()).or_insert((0, rank)).0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.truncate(k);
    Ok(ranked
        .into_iter()
        .map(|(token, (count, _))| TokenCount { token: token.to_owned(), count })
        .collect())
}

pub fn top_k_tokens(corpus: &Corpus, k: usize) -> Result<TopTokens> {
    Ok(TopTokens {
        documents: top_k_side(corpus, Side::Documents, k)?,
        queries: top_k_side(corpus, Side::Queries, k)?,
    })
}

/// Per-record token length distribution of one table.
pub fn length_histogram(corpus: &Corpus, side: Side, bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(Error::invalid_argument("bins must be a positive integer"));
    }
    let lengths: Vec<usize> = sequences(corpus, side).iter().map(|s| s.len()).collect();
    if lengths.is_empty() {
        return Err(Error::EmptyInput(side.as_str()));
    }
    Ok(Histogram::from_counts(&lengths, bins))
}
