//! Named-metric output for dashboards.

use crate::error::Result;
use crate::frequency::TokenCount;
use crate::report::AnalysisReport;
use serde_json::{json, Map, Value};
use std::io::Write;

/// Receives `key -> value` summaries, one call per metric.
pub trait MetricsSink {
    fn log(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Emits every metric as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn log(&mut self, key: &str, value: Value) -> Result<()> {
        tracing::info!(metric = key, %value, "metric");
        Ok(())
    }
}

/// Writes `{"key": .., "value": ..}` objects, one per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self { Self { writer } }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> MetricsSink for JsonLinesSink<W> {
    fn log(&mut self, key: &str, value: Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &json!({ "key": key, "value": value }))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Sends each metric to both sinks.
impl<A: MetricsSink, B: MetricsSink> MetricsSink for (A, B) {
    fn log(&mut self, key: &str, value: Value) -> Result<()> {
        self.0.log(key, value.clone())?;
        self.1.log(key, value)
    }
}

fn token_map(tokens: &[TokenCount]) -> Value {
    let map: Map<String, Value> = tokens.iter().map(|t| (t.token.clone(), json!(t.count))).collect();
    Value::Object(map)
}

/// Push the report's headline numbers and tables into `sink`.
pub fn log_report<S: MetricsSink + ?Sized>(sink: &mut S, report: &AnalysisReport) -> Result<()> {
    let c = &report.triplet_counts;
    sink.log(
        "triplet_count_per_query",
        json!({
            "count": c.queries,
            "mean": c.mean,
            "std": c.std,
            "min": c.min,
            "25%": c.p25,
            "50%": c.median,
            "75%": c.p75,
            "max": c.max,
        }),
    )?;

    let s = &report.token_stats;
    for (prefix, side) in [("doc_tokens", &s.documents), ("query_tokens", &s.queries)] {
        sink.log(&format!("{prefix}/total"), json!(side.total_tokens))?;
        sink.log(&format!("{prefix}/unique"), json!(side.unique_tokens))?;
        sink.log(&format!("{prefix}/avg_len"), json!(side.mean_length))?;
    }

    sink.log("top_doc_tokens", token_map(&report.top_tokens.documents))?;
    sink.log("top_query_tokens", token_map(&report.top_tokens.queries))?;
    sink.log("idf_scores", json!(report.idf_scores))?;

    let o = &report.overlap_summary;
    sink.log("avg_positive_overlap", json!(o.mean_pos_overlap))?;
    sink.log("avg_negative_overlap", json!(o.mean_neg_overlap))?;
    sink.log("hard_negatives", json!(o.hard_negatives))?;
    sink.log("missing_references", json!(o.missing_references))?;
    Ok(())
}
