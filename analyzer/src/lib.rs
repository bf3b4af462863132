use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tripstats_core::persist::{
    load_snapshot, read_documents, read_queries, read_triples, save_report, save_snapshot, save_tsv, SnapshotPaths,
    SnapshotSources, TableFormat,
};
use tripstats_core::sink::{log_report, JsonLinesSink, TracingSink};
use tripstats_core::{AnalysisConfig, AnalysisReport, Corpus, DatasetAnalyzer, ReportOptions, Tables};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub docs: PathBuf,
    pub queries: PathBuf,
    pub triples: PathBuf,
    pub config: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub epsilon: Option<f64>,
    pub bins: Option<usize>,
    pub output: PathBuf,
    pub cache: Option<PathBuf>,
    pub include_rows: bool,
}

/// What a run wrote, for the final log line.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub output: PathBuf,
    pub files: Vec<String>,
    pub triples: usize,
    pub mean_pos_overlap: f64,
    pub mean_neg_overlap: f64,
}

/// Table files under `path`: the file itself, or every supported file below
/// a directory in path order.
pub fn collect_table_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && TableFormat::from_path(p).is_some() {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        bail!("input not found: {}", path.display());
    }
    if files.is_empty() {
        bail!("no .jsonl/.json/.tsv files under {}", path.display());
    }
    Ok(files)
}

fn read_all<T, F>(path: &Path, read: F) -> Result<Vec<T>>
where
    F: Fn(&Path) -> tripstats_core::Result<Vec<T>>,
{
    let mut rows = Vec::new();
    for file in collect_table_files(path)? {
        let mut part = read(&file).with_context(|| format!("reading {}", file.display()))?;
        rows.append(&mut part);
    }
    Ok(rows)
}

pub fn load_tables(docs: &Path, queries: &Path, triples: &Path) -> Result<Tables> {
    let tables = Tables {
        documents: read_all(docs, |p| read_documents(p))?,
        queries: read_all(queries, |p| read_queries(p))?,
        triples: read_all(triples, |p| read_triples(p))?,
    };
    tracing::info!(
        documents = tables.documents.len(),
        queries = tables.queries.len(),
        triples = tables.triples.len(),
        "tables loaded"
    );
    Ok(tables)
}

/// Load from the snapshot when one exists and was built from the same input
/// paths, otherwise read the inputs and (re)write the snapshot.
pub fn load_or_cache(opts: &AnalyzeOptions) -> Result<Tables> {
    let Some(cache) = &opts.cache else {
        return load_tables(&opts.docs, &opts.queries, &opts.triples);
    };
    let paths = SnapshotPaths::new(cache);
    let sources = SnapshotSources::new(&opts.docs, &opts.queries, &opts.triples);
    if paths.exists() {
        let (tables, meta) = load_snapshot(&paths).with_context(|| format!("loading snapshot {}", cache.display()))?;
        if meta.built_from(&sources) {
            tracing::info!(cache = %cache.display(), created_at = %meta.created_at, "using cached tables");
            return Ok(tables);
        }
        tracing::warn!(
            cache = %cache.display(),
            cached = ?meta.sources,
            requested = ?sources,
            "snapshot was built from other inputs; rebuilding"
        );
    }
    let tables = load_tables(&opts.docs, &opts.queries, &opts.triples)?;
    save_snapshot(&paths, &tables, sources)?;
    Ok(tables)
}

/// Config file first, then command-line overrides.
pub fn resolve_config(opts: &AnalyzeOptions) -> Result<AnalysisConfig> {
    let mut config = match &opts.config {
        Some(p) => AnalysisConfig::from_json_file(p).with_context(|| format!("reading config {}", p.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(k) = opts.top_k { config.top_k = k; }
    if let Some(e) = opts.epsilon { config.overlap_epsilon = e; }
    if let Some(b) = opts.bins { config.histogram_bins = b; }
    config.validate()?;
    Ok(config)
}

pub fn run_analyze(opts: &AnalyzeOptions) -> Result<RunSummary> {
    let config = resolve_config(opts)?;
    let tables = load_or_cache(opts)?;
    let analyzer = DatasetAnalyzer::new(Corpus::from_tables(tables), config)?;
    let mut report = analyzer.report(&ReportOptions { top_k: None, include_rows: true })?;
    let files = write_outputs(&opts.output, &mut report, opts.include_rows)?;

    Ok(RunSummary {
        output: opts.output.clone(),
        files,
        triples: report.overlap_summary.triples,
        mean_pos_overlap: report.overlap_summary.mean_pos_overlap,
        mean_neg_overlap: report.overlap_summary.mean_neg_overlap,
    })
}

/// Write the report, the metrics stream and the tables for plotting.
pub fn write_outputs(dir: &Path, report: &mut AnalysisReport, keep_rows: bool) -> Result<Vec<String>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let metrics = BufWriter::new(File::create(dir.join("metrics.jsonl"))?);
    let mut sink = (TracingSink, JsonLinesSink::new(metrics));
    log_report(&mut sink, report)?;
    sink.1.into_inner()?;
    written.push("metrics.jsonl".to_string());

    save_tsv(
        dir.join("triplets_per_query.tsv"),
        &["query_id", "triplets"],
        report.triplet_counts.per_query.iter().map(|c| vec![c.query_id.clone(), c.count.to_string()]),
    )?;
    written.push("triplets_per_query.tsv".to_string());

    save_tsv(
        dir.join("candidates_per_query.tsv"),
        &["query_id", "n_triples", "n_pos", "n_neg", "n_shared"],
        report.candidates.iter().map(|c| {
            vec![
                c.query_id.clone(),
                c.n_triples.to_string(),
                c.n_pos.to_string(),
                c.n_neg.to_string(),
                c.n_shared.to_string(),
            ]
        }),
    )?;
    written.push("candidates_per_query.tsv".to_string());

    if let Some(overlap) = &report.overlap {
        save_tsv(
            dir.join("overlap.tsv"),
            &["query_id", "pos_doc_id", "neg_doc_id", "pos_overlap", "neg_overlap"],
            overlap.rows.iter().map(|r| {
                vec![
                    r.query_id.clone(),
                    r.pos_doc_id.clone(),
                    r.neg_doc_id.clone(),
                    format!("{:.6}", r.pos_overlap),
                    format!("{:.6}", r.neg_overlap),
                ]
            }),
        )?;
        written.push("overlap.tsv".to_string());
    }

    save_report(dir.join("histograms.json"), &report.histograms)?;
    written.push("histograms.json".to_string());

    if !keep_rows {
        report.overlap = None;
    }
    save_report(dir.join("report.json"), &*report)?;
    written.push("report.json".to_string());

    tracing::info!(output = %dir.display(), files = written.len(), "outputs written");
    Ok(written)
}

pub fn run_idf(docs: &Path, tokens: &[String], config: Option<&Path>) -> Result<BTreeMap<String, f64>> {
    let config = match config {
        Some(p) => AnalysisConfig::from_json_file(p)?,
        None => AnalysisConfig::default(),
    };
    let documents = read_all(docs, |p| read_documents(p))?;
    let analyzer = DatasetAnalyzer::new(Corpus::new(documents, Vec::new(), Vec::new()), config)?;
    Ok(analyzer.idf_scores(tokens)?)
}
