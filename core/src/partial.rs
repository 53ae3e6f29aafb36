use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::index::{DocId, PartialRecord, Posting};
use crate::tokenizer::Tokenizer;
use crate::zones::Zones;

/// Term statistics of a single document, one posting per distinct term.
///
/// Each zone is tokenized on its own and the per-zone counts are added into
/// `tf`. Because `body` already contains the title, header and bold text,
/// those occurrences land in `tf` more than once; scoring relies on that.
pub fn postings_for_document(doc_id: DocId, zones: &Zones, tokenizer: &Tokenizer) -> HashMap<String, Posting> {
    let mut per_doc: HashMap<String, Posting> = HashMap::new();
    let mut count = |text: &str, bump: fn(&mut Posting)| {
        for term in tokenizer.tokenize(text) {
            let p = per_doc.entry(term).or_insert(Posting { doc_id, tf: 0, title_tf: 0, header_tf: 0, bold_tf: 0 });
            p.tf += 1;
            bump(p);
        }
    };
    count(&zones.title, |p| p.title_tf += 1);
    count(&zones.headers, |p| p.header_tf += 1);
    count(&zones.bold, |p| p.bold_tf += 1);
    count(&zones.body, |_| {});
    per_doc
}

/// In-memory SPIMI accumulator for one batch of documents.
#[derive(Debug, Default)]
pub struct PartialIndex {
    postings: HashMap<String, Vec<Posting>>, // postings sorted by doc_id
    docs: usize,
}

impl PartialIndex {
    pub fn new() -> Self { Self::default() }

    /// Number of distinct terms held.
    pub fn len(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }

    /// Number of documents added since this accumulator was created.
    pub fn docs(&self) -> usize { self.docs }

    pub fn get(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    /// Add one document. Doc ids are expected in increasing order; a repeated
    /// doc id for the same term is summed into the existing posting.
    pub fn add_document(&mut self, doc_id: DocId, zones: &Zones, tokenizer: &Tokenizer) {
        for (term, posting) in postings_for_document(doc_id, zones, tokenizer) {
            let list = self.postings.entry(term).or_default();
            match list.last_mut() {
                Some(last) if last.doc_id == doc_id => last.absorb(&posting),
                _ => list.push(posting),
            }
        }
        self.docs += 1;
    }

    /// Records in strict lexicographic term order, consuming the accumulator.
    pub fn into_sorted_records(self) -> Vec<PartialRecord> {
        let mut records: Vec<PartialRecord> =
            self.postings.into_iter().map(|(term, postings)| PartialRecord { term, postings }).collect();
        records.sort_unstable_by(|a, b| a.term.cmp(&b.term));
        records
    }

    /// Write the batch as a partial index file, one JSON record per line.
    /// Returns the number of terms written.
    pub fn write_to(self, path: &Path) -> Result<usize> {
        write_partial(path, &self.into_sorted_records())
    }
}

pub fn write_partial(path: &Path, records: &[PartialRecord]) -> Result<usize> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(records.len())
}

/// Handle on a partial index file on disk. Each call to [`PartialFile::records`]
/// starts a fresh read from the beginning of the file.
#[derive(Debug, Clone)]
pub struct PartialFile {
    path: PathBuf,
}

impl PartialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn records(&self) -> Result<PartialReader> {
        let file = File::open(&self.path)?;
        Ok(PartialReader { path: self.path.clone(), reader: BufReader::new(file), offset: 0, line: String::new() })
    }
}

/// Lazy stream of records from one partial file.
pub struct PartialReader {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    line: String,
}

impl PartialReader {
    fn next_record(&mut self) -> Result<Option<PartialRecord>> {
        loop {
            self.line.clear();
            let start = self.offset;
            let read = self.reader.read_line(&mut self.line)?;
            if read == 0 {
                return Ok(None);
            }
            self.offset += read as u64;
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            let record: PartialRecord =
                serde_json::from_str(line).map_err(|e| IndexError::corrupt(&self.path, start, e))?;
            if !crate::index::strictly_ascending(&record.postings) {
                return Err(IndexError::corrupt(
                    &self.path,
                    start,
                    format!("postings for {:?} are not doc_id-ascending", record.term),
                ));
            }
            return Ok(Some(record));
        }
    }
}

impl Iterator for PartialReader {
    type Item = Result<PartialRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
