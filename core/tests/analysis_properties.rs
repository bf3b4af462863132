use proptest::prelude::*;
use std::collections::HashMap;
use tripstats_core::{
    AnalysisConfig, DatasetAnalyzer, DocumentRecord, Error, QueryRecord, ReferenceKind, Tables, Triple,
};

const EPS: f64 = 1e-6;

fn analyzer(tables: Tables) -> DatasetAnalyzer {
    DatasetAnalyzer::from_tables(tables, AnalysisConfig::default()).unwrap()
}

fn cat_dog() -> DatasetAnalyzer {
    analyzer(Tables {
        documents: vec![DocumentRecord::new("doc1", "the cat sat"), DocumentRecord::new("doc2", "the dog ran")],
        queries: vec![QueryRecord::new("q1", "cat sat")],
        triples: vec![Triple::new("q1", "doc1", "doc2")],
    })
}

#[test]
fn worked_example() {
    let a = cat_dog();
    assert_eq!(a.corpus().query_tokens("q1").unwrap(), ["cat", "sat"]);

    let overlap = a.overlap_stats().unwrap();
    assert_eq!(overlap.rows.len(), 1);
    assert!((overlap.rows[0].pos_overlap - 2.0 / (2.0 + EPS)).abs() < 1e-12);
    assert!(overlap.rows[0].pos_overlap < 1.0);
    assert_eq!(overlap.rows[0].neg_overlap, 0.0);
    assert_eq!(overlap.mean_pos_overlap, overlap.rows[0].pos_overlap);

    let idf = a.idf_scores(&["the", "cat"]).unwrap();
    assert!((idf["the"] - 1.0).abs() < 1e-12);
    assert!((idf["cat"] - 1.405).abs() < 1e-3);
}

#[test]
fn empty_query_text_never_errors() {
    let a = analyzer(Tables {
        documents: vec![DocumentRecord::new("doc1", "the cat sat"), DocumentRecord::new("doc2", "")],
        queries: vec![QueryRecord::new("q0", "")],
        triples: vec![Triple::new("q0", "doc1", "doc2")],
    });
    assert!(a.corpus().query_tokens("q0").unwrap().is_empty());
    let overlap = a.overlap_stats().unwrap();
    assert_eq!(overlap.rows[0].pos_overlap, 0.0);
    assert_eq!(overlap.rows[0].neg_overlap, 0.0);
    assert!(overlap.missing.is_empty());
}

#[test]
fn top_k_zero_is_invalid_argument() {
    assert!(matches!(cat_dog().top_k_tokens(0), Err(Error::InvalidArgument(_))));
}

#[test]
fn empty_tables_signal_empty_input() {
    let a = analyzer(Tables::default());
    assert!(matches!(a.token_stats(), Err(Error::EmptyInput(_))));
    assert!(matches!(a.top_k_tokens(5), Err(Error::EmptyInput(_))));
    assert!(matches!(a.idf_scores(&["x"]), Err(Error::EmptyInput("documents"))));
    assert!(matches!(a.overlap_stats(), Err(Error::EmptyInput("triples"))));
    assert!(matches!(a.triplet_counts(), Err(Error::EmptyInput("triples"))));
    assert!(a.candidate_counts().is_empty());
}

#[test]
fn missing_ids_are_lenient_and_reported() {
    let a = analyzer(Tables {
        documents: vec![DocumentRecord::new("doc1", "cat")],
        queries: vec![QueryRecord::new("q1", "cat")],
        triples: vec![Triple::new("q1", "ghost", "doc1")],
    });
    let overlap = a.overlap_stats().unwrap();
    assert_eq!(overlap.rows[0].pos_overlap, 0.0);
    assert!(overlap.rows[0].neg_overlap > 0.99);
    assert_eq!(overlap.missing.len(), 1);
    assert_eq!(overlap.missing[0].kind, ReferenceKind::Positive);
    assert_eq!(overlap.hard_negatives, 1);
}

fn word() -> impl Strategy<Value = String> {
    "[a-f]{1,2}"
}

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 0..8).prop_map(|w| w.join(" "))
}

prop_compose! {
    fn tables()(
        docs in prop::collection::vec(text(), 1..12),
        queries in prop::collection::vec(text(), 1..6),
        picks in prop::collection::vec((0usize..6, 0usize..14, 0usize..14), 0..30),
    ) -> Tables {
        let n_docs = docs.len();
        let n_queries = queries.len();
        Tables {
            documents: docs.into_iter().enumerate().map(|(i, t)| DocumentRecord::new(format!("d{i}"), t)).collect(),
            queries: queries.into_iter().enumerate().map(|(i, t)| QueryRecord::new(format!("q{i}"), t)).collect(),
            // ids past the table ends exercise the missing-reference path
            triples: picks
                .into_iter()
                .map(|(q, p, n)| Triple::new(format!("q{}", q % (n_queries + 1)), format!("d{}", p % (n_docs + 2)), format!("d{}", n % (n_docs + 2))))
                .collect(),
        }
    }
}

proptest! {
    #[test]
    fn idf_is_bounded_and_monotone(tables in tables()) {
        let a = analyzer(tables);
        let n = a.corpus().num_docs() as f64;
        let vocab: Vec<&str> = ["a", "b", "c", "d", "e", "f", "aa", "zz"].to_vec();
        let df = a.document_frequencies(&vocab).unwrap();
        let idf = a.idf_scores(&vocab).unwrap();
        prop_assert_eq!(idf.len(), vocab.len());
        let upper = (n + 1.0).ln() + 1.0;
        for (t, score) in &idf {
            prop_assert!(*score > 0.0);
            prop_assert!(*score <= upper + 1e-12);
            if df[t] == 0 {
                prop_assert!((score - upper).abs() < 1e-12);
            }
        }
        for (t1, s1) in &idf {
            for (t2, s2) in &idf {
                if df[t1] < df[t2] {
                    prop_assert!(s1 > s2);
                }
            }
        }
    }

    #[test]
    fn idf_ignores_input_order(
        tables in tables(),
        rotate in 0usize..12,
        vocab in prop::collection::vec("[a-f]{1,2}", 0..10),
    ) {
        let mut shuffled = tables.clone();
        let shift = rotate % shuffled.documents.len();
        shuffled.documents.rotate_left(shift);
        shuffled.documents.reverse();
        let reordered: Vec<&str> = vocab.iter().rev().map(String::as_str).collect();
        let requested: Vec<&str> = vocab.iter().map(String::as_str).collect();

        let before = analyzer(tables).idf_scores(&requested).unwrap();
        let after = analyzer(shuffled).idf_scores(&reordered).unwrap();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn overlap_ratios_are_bounded(tables in tables()) {
        let a = analyzer(tables);
        if let Ok(report) = a.overlap_stats() {
            for row in &report.rows {
                prop_assert!((0.0..=1.0).contains(&row.pos_overlap));
                prop_assert!((0.0..=1.0).contains(&row.neg_overlap));
            }
            prop_assert!(report.mean_pos_overlap.is_finite());
            prop_assert!(report.mean_neg_overlap.is_finite());
        }
    }

    #[test]
    fn candidate_counts_fit_within_triples(tables in tables()) {
        let a = analyzer(tables);
        let mut per_query: HashMap<String, usize> = HashMap::new();
        for t in a.corpus().triples() {
            *per_query.entry(t.query_id.clone()).or_default() += 1;
        }
        let rows = a.candidate_counts();
        prop_assert_eq!(rows.len(), per_query.len());
        for row in rows {
            prop_assert_eq!(row.n_triples, per_query[&row.query_id]);
            prop_assert!(row.n_pos >= 1 && row.n_pos <= row.n_triples);
            prop_assert!(row.n_neg >= 1 && row.n_neg <= row.n_triples);
            prop_assert!(row.n_shared <= row.n_pos.min(row.n_neg));
        }
    }

    #[test]
    fn triplet_counts_are_conserved(tables in tables()) {
        let total = tables.triples.len();
        let a = analyzer(tables);
        match a.triplet_counts() {
            Ok(counts) => {
                prop_assert_eq!(counts.per_query.iter().map(|c| c.count).sum::<usize>(), total);
                prop_assert_eq!(counts.total, total);
                prop_assert!(counts.min as f64 <= counts.median && counts.median <= counts.max as f64);
            }
            Err(e) => {
                prop_assert_eq!(total, 0);
                prop_assert!(matches!(e, Error::EmptyInput(_)));
            }
        }
    }

    #[test]
    fn superset_candidate_gives_full_ratio(words in prop::collection::vec(word(), 1..6)) {
        let query = words.join(" ");
        let doc = format!("{query} extra tokens");
        let a = analyzer(Tables {
            documents: vec![DocumentRecord::new("p", doc), DocumentRecord::new("n", "")],
            queries: vec![QueryRecord::new("q", query)],
            triples: vec![Triple::new("q", "p", "n")],
        });
        let distinct = a.corpus().query_tokens("q").unwrap().iter().collect::<std::collections::HashSet<_>>().len() as f64;
        let report = a.overlap_stats().unwrap();
        prop_assert!((report.rows[0].pos_overlap - distinct / (distinct + EPS)).abs() < 1e-12);
        prop_assert_eq!(report.rows[0].neg_overlap, 0.0);
    }
}
