use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::error::{IndexError, Result};
use crate::index::{DocId, FinalRecord, Posting};
use crate::lexicon::{Lexicon, LexiconEntry};
use crate::persist::{load_doc_map, load_stats, DocMap, IndexPaths};
use crate::tokenizer::Tokenizer;

/// Extra weight given to occurrences in the boosted zones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneWeights {
    pub title: f64,
    pub header: f64,
    pub bold: f64,
}

impl Default for ZoneWeights {
    fn default() -> Self {
        Self { title: 2.0, header: 1.5, bold: 1.2 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub top_k: usize,
    /// Score and sort candidates. When off, candidates come back in
    /// intersection order with a score of 0.
    pub rank: bool,
    pub stem: bool,
    pub zone_boost: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { top_k: 10, rank: true, stem: true, zone_boost: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    pub terms: Vec<String>,
    /// Documents that matched every term, before truncation to top-K. Zero
    /// when a term is missing from the lexicon.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

/// Reads single records out of the final index by byte offset.
pub struct IndexReader {
    path: PathBuf,
    reader: BufReader<File>,
    line: String,
}

impl IndexReader {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self { path: path.to_path_buf(), reader: BufReader::new(File::open(path)?), line: String::new() })
    }

    /// Seek to `offset` and decode the one record starting there.
    pub fn record_at(&mut self, offset: u64) -> Result<FinalRecord> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(IndexError::corrupt(&self.path, offset, "offset is past the end of the index"));
        }
        FinalRecord::decode(&self.line, &self.path, offset)
    }
}

/// Posting list of one query term together with its document frequency.
#[derive(Debug, Clone)]
pub struct TermPostings {
    pub df: u32,
    pub postings: Vec<Posting>, // sorted by doc_id
}

/// A document that contains every query term, with one posting per term in
/// the order the lists were intersected.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub doc_id: DocId,
    pub postings: Vec<Posting>,
}

#[derive(Debug, Clone, Default)]
pub struct Intersection {
    /// Document frequencies in intersection order, aligned with every
    /// candidate's `postings`.
    pub dfs: Vec<u32>,
    pub candidates: Vec<Candidate>,
}

/// AND-intersection by doc id, shortest list first. Candidates keep the
/// doc_id order of the shortest list.
pub fn intersect(mut lists: Vec<TermPostings>) -> Intersection {
    lists.sort_by_key(|l| l.postings.len());
    let dfs = lists.iter().map(|l| l.df).collect();
    let mut lists = lists.into_iter();
    let Some(first) = lists.next() else {
        return Intersection::default();
    };
    let mut candidates: Vec<Candidate> =
        first.postings.into_iter().map(|p| Candidate { doc_id: p.doc_id, postings: vec![p] }).collect();

    for list in lists {
        if candidates.is_empty() {
            break;
        }
        let mut cursor = list.postings.iter().peekable();
        candidates.retain_mut(|c| {
            while cursor.next_if(|p| p.doc_id < c.doc_id).is_some() {}
            match cursor.next_if(|p| p.doc_id == c.doc_id) {
                Some(p) => {
                    c.postings.push(*p);
                    true
                }
                None => false,
            }
        });
    }
    Intersection { dfs, candidates }
}

pub fn idf(num_docs: u32, df: u32) -> f64 {
    ((num_docs as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0
}

pub fn weighted_tf(p: &Posting, weights: Option<&ZoneWeights>) -> f64 {
    let mut tf = p.tf as f64;
    if let Some(w) = weights {
        tf += w.title * p.title_tf as f64 + w.header * p.header_tf as f64 + w.bold * p.bold_tf as f64;
    }
    tf
}

/// Sum over terms of `(1 + ln weighted_tf) * idf`. `postings` and `dfs` must
/// be in the same order.
pub fn score(postings: &[Posting], dfs: &[u32], num_docs: u32, weights: Option<&ZoneWeights>) -> f64 {
    debug_assert_eq!(postings.len(), dfs.len());
    postings
        .iter()
        .zip(dfs)
        .map(|(p, &df)| {
            let tf = weighted_tf(p, weights);
            let tfw = if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 };
            tfw * idf(num_docs, df)
        })
        .sum()
}

/// Score every candidate and sort by score descending, then doc id
/// ascending on ties.
pub fn rank(intersection: &Intersection, num_docs: u32, weights: Option<&ZoneWeights>) -> Vec<(DocId, f64)> {
    let mut scored: Vec<(DocId, f64)> = intersection
        .candidates
        .iter()
        .map(|c| (c.doc_id, score(&c.postings, &intersection.dfs, num_docs, weights)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
}

/// Disk-backed AND query engine. Holds the lexicon and the doc map in memory
/// and reads postings for the query terms only. Each query opens its own
/// handle on the final index, so one engine can serve concurrent callers.
pub struct SearchEngine {
    index_path: PathBuf,
    lexicon: Lexicon,
    docs: DocMap,
    weights: ZoneWeights,
    index_stemmed: Option<bool>,
}

impl SearchEngine {
    pub fn new(index_path: PathBuf, lexicon: Lexicon, docs: DocMap) -> Self {
        Self { index_path, lexicon, docs, weights: ZoneWeights::default(), index_stemmed: None }
    }

    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let index_path = paths.final_index();
        // fail at startup rather than on the first query
        File::open(&index_path)?;
        let lexicon = Lexicon::load(&paths.lexicon())?;
        let docs = load_doc_map(paths)?;
        let index_stemmed = load_stats(paths)?.map(|s| s.stemming);
        if index_stemmed.is_some_and(|s| s != SearchOptions::default().stem) {
            tracing::warn!(
                ?index_stemmed,
                "index stemming differs from the query default; pass a matching stem option or lookups will miss"
            );
        }
        tracing::info!(terms = lexicon.len(), docs = docs.len(), "search index loaded");
        Ok(Self { index_stemmed, ..Self::new(index_path, lexicon, docs) })
    }

    /// Whether the index was built with stemming, when its build stats are
    /// available. Queries should tokenize the same way.
    pub fn index_stemmed(&self) -> Option<bool> { self.index_stemmed }

    pub fn num_docs(&self) -> u32 { self.docs.len() }

    pub fn lexicon(&self) -> &Lexicon { &self.lexicon }

    pub fn url(&self, doc_id: DocId) -> Option<&str> { self.docs.url(doc_id) }

    /// Look up and read the posting list of every term. `None` when any term
    /// is missing from the lexicon.
    fn fetch(&self, terms: &[String]) -> Result<Option<Vec<TermPostings>>> {
        let mut entries: Vec<LexiconEntry> = Vec::with_capacity(terms.len());
        for term in terms {
            match self.lexicon.get(term) {
                Some(e) => entries.push(e),
                None => return Ok(None),
            }
        }
        let mut reader = IndexReader::open(&self.index_path)?;
        let mut lists = Vec::with_capacity(terms.len());
        for (term, entry) in terms.iter().zip(entries) {
            let record = reader.record_at(entry.offset)?;
            if record.term != *term {
                return Err(IndexError::corrupt(
                    &self.index_path,
                    entry.offset,
                    format!("lexicon points {term:?} at the record for {:?}", record.term),
                ));
            }
            lists.push(TermPostings { df: entry.df, postings: record.postings });
        }
        Ok(Some(lists))
    }

    pub fn search(&self, query: &str, opts: &SearchOptions) -> Result<SearchOutcome> {
        let start = Instant::now();
        let terms = Tokenizer::new(opts.stem).tokenize(query);
        let mut outcome = SearchOutcome { terms, ..Default::default() };
        if outcome.terms.is_empty() {
            return Ok(outcome);
        }
        let Some(lists) = self.fetch(&outcome.terms)? else {
            tracing::debug!(terms = ?outcome.terms, "query term missing from lexicon");
            return Ok(outcome);
        };

        let intersection = intersect(lists);
        outcome.total_hits = intersection.candidates.len();
        let ranked: Vec<(DocId, f64)> = if opts.rank {
            let weights = opts.zone_boost.then_some(&self.weights);
            rank(&intersection, self.num_docs(), weights)
        } else {
            intersection.candidates.iter().map(|c| (c.doc_id, 0.0)).collect()
        };
        outcome.hits = ranked
            .into_iter()
            .take(opts.top_k)
            .map(|(doc_id, score)| SearchHit { doc_id, score, url: self.url(doc_id).map(str::to_string) })
            .collect();

        tracing::debug!(terms = ?outcome.terms, candidates = outcome.total_hits, elapsed_us = start.elapsed().as_micros() as u64, "query done");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(doc_id: DocId, tf: u32, title_tf: u32) -> Posting {
        Posting { doc_id, tf, title_tf, header_tf: 0, bold_tf: 0 }
    }

    fn list(df: u32, ids: &[DocId]) -> TermPostings {
        TermPostings { df, postings: ids.iter().map(|&d| p(d, 1, 0)).collect() }
    }

    #[test]
    fn intersect_keeps_common_docs_in_processing_order() {
        let long = TermPostings { df: 5, postings: vec![p(1, 7, 0), p(2, 1, 0), p(3, 1, 0), p(5, 1, 0), p(8, 1, 0)] };
        let short = TermPostings { df: 2, postings: vec![p(1, 2, 1), p(8, 3, 0)] };
        let out = intersect(vec![long, short]);
        assert_eq!(out.dfs, vec![2, 5]);
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.candidates[0].doc_id, 1);
        // shortest list's posting first, aligned with dfs
        assert_eq!(out.candidates[0].postings, vec![p(1, 2, 1), p(1, 7, 0)]);
    }

    #[test]
    fn intersect_empty_cases() {
        assert!(intersect(vec![]).candidates.is_empty());
        let out = intersect(vec![list(2, &[1, 3]), list(2, &[2, 4]), list(3, &[1, 2, 3])]);
        assert!(out.candidates.is_empty());
        assert_eq!(out.dfs.len(), 3);
    }

    #[test]
    fn idf_and_tf_components() {
        assert!((idf(3, 3) - 1.0).abs() < 1e-12);
        assert!((idf(3, 1) - (2.0f64.ln() + 1.0)).abs() < 1e-12);
        let posting = Posting { doc_id: 0, tf: 3, title_tf: 1, header_tf: 1, bold_tf: 1 };
        assert!((weighted_tf(&posting, Some(&ZoneWeights::default())) - 7.7).abs() < 1e-12);
        assert_eq!(weighted_tf(&posting, None), 3.0);
        assert_eq!(score(&[p(0, 0, 0)], &[1], 3, None), 0.0);
    }

    #[test]
    fn title_boost_never_lowers_score() {
        let weights = ZoneWeights::default();
        let mut posting = p(0, 4, 0);
        let mut last = score(&[posting], &[2], 10, Some(&weights));
        for _ in 0..5 {
            posting.title_tf += 1;
            let next = score(&[posting], &[2], 10, Some(&weights));
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn rank_breaks_ties_by_doc_id() {
        let out = intersect(vec![list(3, &[7, 2, 5])]);
        let ranked = rank(&out, 10, None);
        assert_eq!(ranked.iter().map(|r| r.0).collect::<Vec<_>>(), vec![2, 5, 7]);
    }
}
