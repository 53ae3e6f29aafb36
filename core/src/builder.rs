use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::error::{IndexError, Result};
use crate::index::DocId;
use crate::lexicon::build_lexicon;
use crate::merge::merge_partials;
use crate::partial::PartialIndex;
use crate::persist::{file_size_kb, save_doc_map, save_stats, DocMap, IndexPaths, StatsFile};
use crate::tokenizer::Tokenizer;
use crate::zones::Zones;

pub const DEFAULT_FLUSH_DOCS: usize = 6000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    flush_docs: usize,
    stem: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { flush_docs: DEFAULT_FLUSH_DOCS, stem: true }
    }
}

impl IndexConfig {
    /// `flush_docs` is the number of documents per partial index; it must be
    /// at least 1.
    pub fn new(flush_docs: usize, stem: bool) -> Result<Self> {
        if flush_docs == 0 {
            return Err(IndexError::Config("flush threshold must be at least 1 document".into()));
        }
        Ok(Self { flush_docs, stem })
    }

    pub fn flush_docs(&self) -> usize { self.flush_docs }

    pub fn stem(&self) -> bool { self.stem }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub indexed_documents: u32,
    pub unique_terms: usize,
    pub index_size_kb: f64,
    pub partials: Vec<PathBuf>,
    pub final_index: PathBuf,
    pub lexicon: PathBuf,
    pub doc_map: PathBuf,
}

/// SPIMI indexing pass: accumulates postings in memory, flushes a sorted
/// partial index every `flush_docs` documents, then merges the partials and
/// builds the lexicon in [`IndexBuilder::finish`].
pub struct IndexBuilder {
    config: IndexConfig,
    paths: IndexPaths,
    tokenizer: Tokenizer,
    batch: PartialIndex,
    urls: Vec<String>,
    partials: Vec<PathBuf>,
}

impl IndexBuilder {
    pub fn create(paths: IndexPaths, config: IndexConfig) -> Result<Self> {
        fs::create_dir_all(paths.partials_dir())?;
        Ok(Self {
            tokenizer: Tokenizer::new(config.stem),
            config,
            paths,
            batch: PartialIndex::new(),
            urls: Vec::new(),
            partials: Vec::new(),
        })
    }

    pub fn doc_count(&self) -> u32 { self.urls.len() as u32 }

    pub fn partials(&self) -> &[PathBuf] { &self.partials }

    /// Index one page, assigning it the next dense doc id.
    pub fn add_document(&mut self, url: String, zones: &Zones) -> Result<DocId> {
        let doc_id = self.doc_count();
        self.urls.push(url);
        self.batch.add_document(doc_id, zones, &self.tokenizer);
        if self.urls.len() % self.config.flush_docs == 0 {
            self.flush()?;
        }
        Ok(doc_id)
    }

    /// Parse raw HTML into zones and index it.
    pub fn add_html(&mut self, url: String, html: &str) -> Result<DocId> {
        self.add_document(url, &Zones::extract(html))
    }

    /// Hand the current batch to the writer and start a fresh one. An empty
    /// batch produces no file.
    fn flush(&mut self) -> Result<()> {
        let batch = std::mem::take(&mut self.batch);
        if batch.is_empty() {
            return Ok(());
        }
        let path = self.paths.partial(self.partials.len());
        let docs = batch.docs();
        let terms = batch.write_to(&path)?;
        tracing::info!(partial = %path.display(), terms, docs, "flushed partial index");
        self.partials.push(path);
        Ok(())
    }

    /// Final flush, k-way merge, lexicon, doc map and build stats.
    pub fn finish(mut self) -> Result<BuildSummary> {
        self.flush()?;
        let final_index = self.paths.final_index();
        let unique_terms = merge_partials(self.partials.as_slice(), &final_index)?;
        let lexicon = self.paths.lexicon();
        build_lexicon(&final_index, &lexicon)?;

        let indexed_documents = self.doc_count();
        save_doc_map(&self.paths, &DocMap::new(std::mem::take(&mut self.urls)))?;

        let index_size_kb = file_size_kb(&final_index)?;
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        save_stats(
            &self.paths,
            &StatsFile {
                indexed_documents,
                unique_terms,
                index_size_kb,
                partials_written: self.partials.len(),
                stemming: self.config.stem,
                flush_docs: self.config.flush_docs,
                created_at,
            },
        )?;
        tracing::info!(indexed_documents, unique_terms, index_size_kb, "index build complete");

        Ok(BuildSummary {
            indexed_documents,
            unique_terms,
            index_size_kb,
            partials: self.partials,
            final_index,
            lexicon,
            doc_map: self.paths.doc_map(),
        })
    }
}
