use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::index::{FinalRecord, PartialRecord, Posting};
use crate::partial::{PartialFile, PartialReader};

/// Head record of one source in the merge heap. Ordered by term, then by
/// source index so equal terms always pop in source order.
struct Head {
    term: String,
    source: usize,
    postings: Vec<Posting>,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        self.term.cmp(&other.term).then(self.source.cmp(&other.source))
    }
}

struct Source {
    path: PathBuf,
    reader: PartialReader,
    last_term: Option<String>,
}

impl Source {
    /// Next record, checking that terms within the file strictly increase.
    fn pull(&mut self, index: usize) -> Result<Option<Head>> {
        let Some(record) = self.reader.next().transpose()? else {
            return Ok(None);
        };
        let PartialRecord { term, postings } = record;
        if let Some(previous) = self.last_term.as_ref() {
            if *previous >= term {
                return Err(IndexError::UnsortedPartial { path: self.path.clone(), previous: previous.clone(), term });
            }
        }
        self.last_term = Some(term.clone());
        Ok(Some(Head { term, source: index, postings }))
    }
}

/// Merge two doc_id-ascending posting lists, summing postings that share a
/// doc id. The result stays doc_id-ascending.
pub fn merge_postings(a: Vec<Posting>, b: Vec<Posting>) -> Vec<Posting> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();
    loop {
        match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => match x.doc_id.cmp(&y.doc_id) {
                Ordering::Less => out.extend(a.next()),
                Ordering::Greater => out.extend(b.next()),
                Ordering::Equal => {
                    if let (Some(mut x), Some(y)) = (a.next(), b.next()) {
                        x.absorb(&y);
                        out.push(x);
                    }
                }
            },
            (Some(_), None) => {
                out.extend(a);
                break;
            }
            (None, _) => {
                out.extend(b);
                break;
            }
        }
    }
    out
}

fn write_record<W: Write>(out: &mut W, term: String, postings: Vec<Posting>) -> Result<()> {
    serde_json::to_writer(&mut *out, &FinalRecord::new(term, postings))?;
    out.write_all(b"\n")?;
    Ok(())
}

/// K-way merge of term-sorted partial index files into one final index.
///
/// Holds at most one pending record per source plus the term being
/// accumulated. Returns the number of distinct terms written.
pub fn merge_partials<P: AsRef<Path>>(partials: &[P], out_path: &Path) -> Result<usize> {
    let mut sources = Vec::with_capacity(partials.len());
    for p in partials {
        let file = PartialFile::new(p.as_ref());
        sources.push(Source { path: file.path().to_path_buf(), reader: file.records()?, last_term: None });
    }

    let mut heap: BinaryHeap<Reverse<Head>> = BinaryHeap::with_capacity(sources.len());
    for (i, source) in sources.iter_mut().enumerate() {
        if let Some(head) = source.pull(i)? {
            heap.push(Reverse(head));
        }
    }

    if let Some(dir) = out_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(out_path)?);
    let mut unique_terms = 0usize;
    let mut current: Option<(String, Vec<Posting>)> = None;

    while let Some(Reverse(head)) = heap.pop() {
        let Head { term, source, postings } = head;
        current = match current.take() {
            Some((cur_term, cur_postings)) if cur_term == term => Some((cur_term, merge_postings(cur_postings, postings))),
            Some((cur_term, cur_postings)) => {
                write_record(&mut out, cur_term, cur_postings)?;
                unique_terms += 1;
                Some((term, postings))
            }
            None => Some((term, postings)),
        };
        if let Some(next) = sources[source].pull(source)? {
            heap.push(Reverse(next));
        }
    }
    if let Some((term, postings)) = current {
        write_record(&mut out, term, postings)?;
        unique_terms += 1;
    }
    out.flush()?;

    tracing::info!(sources = partials.len(), unique_terms, output = %out_path.display(), "merged partial indexes");
    Ok(unique_terms)
}

/// Every `*.jsonl` file in `dir`, sorted by file name.
pub fn list_partials(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
