use crate::error::{IndexError, Result};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Build statistics written next to the index once a build completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsFile {
    pub indexed_documents: u32,
    pub unique_terms: usize,
    pub index_size_kb: f64,
    pub partials_written: usize,
    pub stemming: bool,
    pub flush_docs: usize,
    pub created_at: String,
}

/// File layout of one index directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn partials_dir(&self) -> PathBuf { self.root.join("partials") }
    pub fn partial(&self, seq: usize) -> PathBuf { self.partials_dir().join(format!("partial_{seq:04}.jsonl")) }
    pub fn final_index(&self) -> PathBuf { self.root.join("index_final.jsonl") }
    pub fn lexicon(&self) -> PathBuf { self.root.join("lexicon.tsv") }
    pub fn doc_map(&self) -> PathBuf { self.root.join("doc_id_to_url.json") }
    pub fn stats(&self) -> PathBuf { self.root.join("stats.json") }
}

/// Dense doc id to URL table, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMap {
    pub doc_count: u32,
    pub doc_id_to_url: Vec<String>,
}

impl DocMap {
    pub fn new(urls: Vec<String>) -> Self {
        Self { doc_count: urls.len() as u32, doc_id_to_url: urls }
    }

    pub fn url(&self, doc_id: DocId) -> Option<&str> {
        self.doc_id_to_url.get(doc_id as usize).map(String::as_str)
    }

    pub fn len(&self) -> u32 { self.doc_count }

    pub fn is_empty(&self) -> bool { self.doc_count == 0 }
}

pub fn save_doc_map(paths: &IndexPaths, map: &DocMap) -> Result<()> {
    save_json(&paths.doc_map(), map)
}

pub fn load_doc_map(paths: &IndexPaths) -> Result<DocMap> {
    let path = paths.doc_map();
    let map: DocMap = load_json(&path)?;
    if map.doc_count as usize != map.doc_id_to_url.len() {
        return Err(IndexError::CorruptDocMap {
            path,
            reason: format!("doc_count {} but {} urls", map.doc_count, map.doc_id_to_url.len()),
        });
    }
    Ok(map)
}

pub fn save_stats(paths: &IndexPaths, stats: &StatsFile) -> Result<()> {
    save_json(&paths.stats(), stats)
}

/// Stats of the build that produced `paths`, or `None` for an index built
/// without them.
pub fn load_stats(paths: &IndexPaths) -> Result<Option<StatsFile>> {
    let path = paths.stats();
    if !path.exists() {
        return Ok(None);
    }
    load_json(&path).map(Some)
}

pub fn file_size_kb(path: &Path) -> Result<f64> {
    Ok(std::fs::metadata(path)?.len() as f64 / 1024.0)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let mut f = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let f = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(f))?)
}
