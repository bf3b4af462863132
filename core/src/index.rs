use crate::tokenizer::tokenize;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type DocId = String;
pub type QueryId = String;

/// Passage row as it arrives from the corpus loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(alias = "docno", alias = "id", deserialize_with = "deserialize_id")]
    pub doc_id: DocId,
    #[serde(alias = "body", alias = "passage", alias = "doc_text")]
    pub text: String,
}

/// Query row as it arrives from the corpus loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    #[serde(alias = "qid", alias = "id", deserialize_with = "deserialize_id")]
    pub query_id: QueryId,
    #[serde(alias = "query", alias = "query_text")]
    pub text: String,
}

/// One (query, positive passage, negative passage) training row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    #[serde(alias = "qid", deserialize_with = "deserialize_id")]
    pub query_id: QueryId,
    #[serde(alias = "pos", alias = "positive", deserialize_with = "deserialize_id")]
    pub doc_id_a: DocId,
    #[serde(alias = "neg", alias = "negative", deserialize_with = "deserialize_id")]
    pub doc_id_b: DocId,
}

impl DocumentRecord {
    pub fn new(doc_id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self { doc_id: doc_id.into(), text: text.into() }
    }
}

impl QueryRecord {
    pub fn new(query_id: impl Into<QueryId>, text: impl Into<String>) -> Self {
        Self { query_id: query_id.into(), text: text.into() }
    }
}

impl Triple {
    pub fn new(query_id: impl Into<QueryId>, pos: impl Into<DocId>, neg: impl Into<DocId>) -> Self {
        Self { query_id: query_id.into(), doc_id_a: pos.into(), doc_id_b: neg.into() }
    }
}

/// The three raw tables, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    pub documents: Vec<DocumentRecord>,
    pub queries: Vec<QueryRecord>,
    pub triples: Vec<Triple>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: DocId,
    pub text: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query_id: QueryId,
    pub text: String,
    pub tokens: Vec<String>,
}

/// Tokenized tables plus the id lookup maps, built once and read-only after.
#[derive(Debug, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    queries: Vec<Query>,
    triples: Vec<Triple>,
    doc_map: HashMap<DocId, usize>,
    query_map: HashMap<QueryId, usize>,
}

impl Corpus {
    pub fn new(documents: Vec<DocumentRecord>, queries: Vec<QueryRecord>, triples: Vec<Triple>) -> Self {
        let documents: Vec<Document> = documents
            .into_iter()
            .map(|r| Document { tokens: tokenize(&r.text), doc_id: r.doc_id, text: r.text })
            .collect();
        let queries: Vec<Query> = queries
            .into_iter()
            .map(|r| Query { tokens: tokenize(&r.text), query_id: r.query_id, text: r.text })
            .collect();

        // Duplicate ids: the later row wins
        let doc_map = documents.iter().enumerate().map(|(i, d)| (d.doc_id.clone(), i)).collect();
        let query_map = queries.iter().enumerate().map(|(i, q)| (q.query_id.clone(), i)).collect();

        tracing::debug!(
            documents = documents.len(),
            queries = queries.len(),
            triples = triples.len(),
            "built lookup maps"
        );
        Self { documents, queries, triples, doc_map, query_map }
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self::new(tables.documents, tables.queries, tables.triples)
    }

    pub fn documents(&self) -> &[Document] { &self.documents }
    pub fn queries(&self) -> &[Query] { &self.queries }
    pub fn triples(&self) -> &[Triple] { &self.triples }
    pub fn num_docs(&self) -> usize { self.documents.len() }

    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.doc_map.get(doc_id).map(|&i| &self.documents[i])
    }

    pub fn query(&self, query_id: &str) -> Option<&Query> {
        self.query_map.get(query_id).map(|&i| &self.queries[i])
    }

    pub fn doc_tokens(&self, doc_id: &str) -> Option<&[String]> {
        self.document(doc_id).map(|d| d.tokens.as_slice())
    }

    pub fn query_tokens(&self, query_id: &str) -> Option<&[String]> {
        self.query(query_id).map(|q| q.tokens.as_slice())
    }

    /// Tokens of `doc_id`, or no tokens when the id is not in the table.
    pub fn resolve_doc_tokens(&self, doc_id: &str) -> &[String] {
        self.doc_tokens(doc_id).unwrap_or_default()
    }

    /// Tokens of `query_id`, or no tokens when the id is not in the table.
    pub fn resolve_query_tokens(&self, query_id: &str) -> &[String] {
        self.query_tokens(query_id).unwrap_or_default()
    }
}

/// Identifiers are strings; JSON numbers are accepted and kept as their decimal text.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or integer identifier")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> { Ok(v.to_owned()) }
        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> { Ok(v) }
        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> { Ok(v.to_string()) }
        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> { Ok(v.to_string()) }
    }

    // Self-describing formats may carry numbers; bincode snapshots always hold strings.
    if deserializer.is_human_readable() {
        deserializer.deserialize_any(IdVisitor)
    } else {
        deserializer.deserialize_string(IdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_maps_resolve_tokens() {
        let corpus = Corpus::new(
            vec![DocumentRecord::new("d1", "the cat sat"), DocumentRecord::new("d2", "")],
            vec![QueryRecord::new("q1", "cat sat")],
            vec![Triple::new("q1", "d1", "d2")],
        );
        assert_eq!(corpus.doc_tokens("d1").unwrap(), ["the", "cat", "sat"]);
        assert_eq!(corpus.doc_tokens("d2").unwrap().len(), 0);
        assert_eq!(corpus.query_tokens("q1").unwrap(), ["cat", "sat"]);
        assert!(corpus.doc_tokens("missing").is_none());
        assert!(corpus.query_tokens("missing").is_none());
    }

    #[test]
    fn unknown_ids_resolve_to_no_tokens() {
        let corpus = Corpus::new(
            vec![DocumentRecord::new("d1", "a b")],
            vec![QueryRecord::new("q1", "a")],
            vec![],
        );
        assert!(corpus.resolve_doc_tokens("ghost").is_empty());
        assert!(corpus.resolve_query_tokens("ghost").is_empty());
        assert_eq!(corpus.resolve_doc_tokens("d1"), ["a", "b"]);
        assert_eq!(corpus.resolve_query_tokens("q1"), ["a"]);
    }

    #[test]
    fn duplicate_ids_keep_last_row() {
        let corpus = Corpus::new(
            vec![DocumentRecord::new("d1", "first"), DocumentRecord::new("d1", "second")],
            vec![],
            vec![],
        );
        assert_eq!(corpus.num_docs(), 2);
        assert_eq!(corpus.doc_tokens("d1").unwrap(), ["second"]);
    }

    #[test]
    fn records_accept_aliases_and_numeric_ids() {
        let d: DocumentRecord = serde_json::from_str(r#"{"docno": 7, "body": "x y"}"#).unwrap();
        assert_eq!(d, DocumentRecord::new("7", "x y"));
        let q: QueryRecord = serde_json::from_str(r#"{"qid": "q9", "query": "hello"}"#).unwrap();
        assert_eq!(q, QueryRecord::new("q9", "hello"));
        let t: Triple = serde_json::from_str(r#"{"query_id": 1, "doc_id_a": "2", "doc_id_b": 3}"#).unwrap();
        assert_eq!(t, Triple::new("1", "2", "3"));
    }

    #[test]
    fn tables_roundtrip_through_bincode() {
        let tables = Tables {
            documents: vec![DocumentRecord::new("d1", "a b")],
            queries: vec![QueryRecord::new("q1", "a")],
            triples: vec![Triple::new("q1", "d1", "d2")],
        };
        let bytes = bincode::serialize(&tables).unwrap();
        let back: Tables = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, tables);
    }
}
