use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::index::Corpus;
use crate::tokenizer::{is_token, token_set};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Number of documents containing each requested token at least once.
///
/// Only the requested tokens are counted; every one of them is present in
/// the result, with zero when no document contains it.
pub fn document_frequencies<S: AsRef<str>>(corpus: &Corpus, tokens: &[S]) -> Result<BTreeMap<String, usize>> {
    let wanted = requested_tokens(tokens)?;
    let mut df: HashMap<&str, usize> = wanted.iter().map(|&t| (t, 0)).collect();
    for doc in corpus.documents() {
        for t in token_set(&doc.tokens) {
            if let Some(n) = df.get_mut(t) {
                *n += 1;
            }
        }
    }
    Ok(df.into_iter().map(|(t, n)| (t.to_owned(), n)).collect())
}

/// Smoothed IDF: `ln((N + s) / (df + s)) + offset`.
pub fn idf_value(num_docs: usize, df: usize, config: &AnalysisConfig) -> f64 {
    let s = config.idf_smoothing;
    ((num_docs as f64 + s) / (df as f64 + s)).ln() + config.idf_offset
}

pub fn idf_scores<S: AsRef<str>>(
    corpus: &Corpus,
    tokens: &[S],
    config: &AnalysisConfig,
) -> Result<BTreeMap<String, f64>> {
    let n = corpus.num_docs();
    if n == 0 {
        return Err(Error::EmptyInput("documents"));
    }
    let df = document_frequencies(corpus, tokens)?;
    Ok(df
        .into_iter()
        .map(|(t, d)| {
            let score = idf_value(n, d, config);
            (t, score)
        })
        .collect())
}

fn requested_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<HashSet<&str>> {
    tokens
        .iter()
        .map(|t| {
            let t = t.as_ref();
            if is_token(t) {
                Ok(t)
            } else {
                Err(Error::invalid_argument(format!("not a whitespace-free token: {t:?}")))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentRecord;

    fn corpus() -> Corpus {
        Corpus::new(
            vec![DocumentRecord::new("doc1", "the cat sat"), DocumentRecord::new("doc2", "the dog ran")],
            vec![],
            vec![],
        )
    }

    #[test]
    fn df_counts_each_document_once() {
        let c = Corpus::new(
            vec![DocumentRecord::new("a", "x x x y"), DocumentRecord::new("b", "x")],
            vec![],
            vec![],
        );
        let df = document_frequencies(&c, &["x", "y", "z"]).unwrap();
        assert_eq!(df["x"], 2);
        assert_eq!(df["y"], 1);
        assert_eq!(df["z"], 0);
    }

    #[test]
    fn idf_matches_smoothed_formula() {
        let scores = idf_scores(&corpus(), &["the", "cat", "zebra"], &AnalysisConfig::default()).unwrap();
        assert_eq!(scores.len(), 3);
        assert!((scores["the"] - 1.0).abs() < 1e-12);
        assert!((scores["cat"] - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
        assert!((scores["cat"] - 1.405).abs() < 1e-3);
        // absent token reaches the upper bound ln(N+1)+1
        assert!((scores["zebra"] - (3.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn duplicate_requests_collapse() {
        let scores = idf_scores(&corpus(), &["cat", "cat"], &AnalysisConfig::default()).unwrap();
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn empty_request_gives_empty_map() {
        let none: [&str; 0] = [];
        assert!(idf_scores(&corpus(), &none, &AnalysisConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let c = Corpus::default();
        assert!(matches!(
            idf_scores(&c, &["cat"], &AnalysisConfig::default()),
            Err(Error::EmptyInput("documents"))
        ));
    }

    #[test]
    fn rejects_non_tokens() {
        let cfg = AnalysisConfig::default();
        assert!(matches!(idf_scores(&corpus(), &["two words"], &cfg), Err(Error::InvalidArgument(_))));
        assert!(matches!(idf_scores(&corpus(), &[""], &cfg), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn custom_smoothing() {
        let cfg = AnalysisConfig { idf_smoothing: 0.5, idf_offset: 0.0, ..Default::default() };
        let scores = idf_scores(&corpus(), &["cat"], &cfg).unwrap();
        assert!((scores["cat"] - (2.5f64 / 1.5).ln()).abs() < 1e-12);
    }
}
