use crate::error::{Error, Result};
use crate::index::{DocumentRecord, QueryRecord, Tables, Triple};
use crate::report::now_rfc3339;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    JsonLines,
    Json,
    Tsv,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => Some(TableFormat::JsonLines),
            Some("json") => Some(TableFormat::Json),
            Some("tsv") => Some(TableFormat::Tsv),
            _ => None,
        }
    }
}

/// Passages: JSON objects, or `doc_id<TAB>text` lines.
pub fn read_documents<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentRecord>> {
    read_table(path.as_ref(), 2, |f| DocumentRecord::new(f[0], f[1]))
}

/// Queries: JSON objects, or `query_id<TAB>text` lines.
pub fn read_queries<P: AsRef<Path>>(path: P) -> Result<Vec<QueryRecord>> {
    read_table(path.as_ref(), 2, |f| QueryRecord::new(f[0], f[1]))
}

/// Triples: JSON objects, or `query_id<TAB>pos_id<TAB>neg_id` lines.
pub fn read_triples<P: AsRef<Path>>(path: P) -> Result<Vec<Triple>> {
    read_table(path.as_ref(), 3, |f| Triple::new(f[0], f[1], f[2]))
}

fn read_table<T, F>(path: &Path, tsv_fields: usize, from_fields: F) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&[&str]) -> T,
{
    let format = TableFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();

    match format {
        TableFormat::Json => {
            let json: serde_json::Value = serde_json::from_reader(reader)?;
            match json {
                serde_json::Value::Array(arr) => {
                    for (i, v) in arr.into_iter().enumerate() {
                        rows.push(serde_json::from_value(v).map_err(|e| Error::parse(path, i + 1, e))?);
                    }
                }
                obj @ serde_json::Value::Object(_) => {
                    rows.push(serde_json::from_value(obj).map_err(|e| Error::parse(path, 1, e))?);
                }
                _ => return Err(Error::parse(path, 1, "expected an array or object")),
            }
        }
        TableFormat::JsonLines => {
            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() { continue; }
                rows.push(serde_json::from_str(&line).map_err(|e| Error::parse(path, i + 1, e))?);
            }
        }
        TableFormat::Tsv => {
            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() { continue; }
                // The last column keeps any further tabs
                let fields: Vec<&str> = line.splitn(tsv_fields, '\t').collect();
                if fields.len() != tsv_fields {
                    return Err(Error::parse(
                        path,
                        i + 1,
                        format!("expected {tsv_fields} tab-separated fields, got {}", fields.len()),
                    ));
                }
                rows.push(from_fields(&fields));
            }
        }
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(rows)
}

/// Input paths a snapshot was built from, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSources {
    pub documents: PathBuf,
    pub queries: PathBuf,
    pub triples: PathBuf,
}

impl SnapshotSources {
    pub fn new(documents: &Path, queries: &Path, triples: &Path) -> Self {
        Self {
            documents: documents.to_path_buf(),
            queries: queries.to_path_buf(),
            triples: triples.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub documents: usize,
    pub queries: usize,
    pub triples: usize,
    pub created_at: String,
    pub version: u32,
    /// Absent in snapshots written before sources were recorded
    #[serde(default)]
    pub sources: Option<SnapshotSources>,
}

impl SnapshotMeta {
    /// True when the snapshot was built from exactly these input paths.
    pub fn built_from(&self, sources: &SnapshotSources) -> bool {
        self.sources.as_ref() == Some(sources)
    }
}

/// On-disk layout of a cached copy of the three tables.
pub struct SnapshotPaths {
    pub root: PathBuf,
}

impl SnapshotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn tables(&self) -> PathBuf { self.root.join("tables.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    pub fn exists(&self) -> bool {
        self.tables().is_file() && self.meta().is_file()
    }
}

pub fn save_snapshot(paths: &SnapshotPaths, tables: &Tables, sources: SnapshotSources) -> Result<SnapshotMeta> {
    create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.tables())?);
    bincode::serialize_into(&mut f, tables)?;
    f.flush()?;

    let meta = SnapshotMeta {
        documents: tables.documents.len(),
        queries: tables.queries.len(),
        triples: tables.triples.len(),
        created_at: now_rfc3339()?,
        version: SNAPSHOT_VERSION,
        sources: Some(sources),
    };
    let mut f = File::create(paths.meta())?;
    f.write_all(serde_json::to_string_pretty(&meta)?.as_bytes())?;
    tracing::info!(root = %paths.root.display(), "snapshot saved");
    Ok(meta)
}

pub fn load_snapshot(paths: &SnapshotPaths) -> Result<(Tables, SnapshotMeta)> {
    let mut buf = String::new();
    File::open(paths.meta())?.read_to_string(&mut buf)?;
    let meta: SnapshotMeta = serde_json::from_str(&buf)?;
    if meta.version != SNAPSHOT_VERSION {
        return Err(Error::invalid_argument(format!(
            "snapshot version {} is not supported (expected {SNAPSHOT_VERSION})",
            meta.version
        )));
    }
    let reader = BufReader::new(File::open(paths.tables())?);
    let tables: Tables = bincode::deserialize_from(reader)?;
    Ok((tables, meta))
}

pub fn save_report<P: AsRef<Path>, T: Serialize>(path: P, report: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut f, report)?;
    f.flush()?;
    Ok(())
}

/// Write a header line and tab-separated rows.
pub fn save_tsv<P, I>(path: P, header: &[&str], rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut f = BufWriter::new(File::create(path)?);
    writeln!(f, "{}", header.join("\t"))?;
    for row in rows {
        writeln!(f, "{}", row.join("\t"))?;
    }
    f.flush()?;
    Ok(())
}
