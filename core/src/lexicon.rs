use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

/// Where a term's record lives in the final index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexiconEntry {
    pub offset: u64,
    pub df: u32,
}

/// Only the leading fields of a final index record; postings are skipped.
#[derive(Deserialize)]
struct RecordHead {
    term: String,
    df: u32,
}

/// Scan the final index once and write `term \t offset \t df` per record.
/// Returns the number of terms. The index must be fully merged and must not
/// change afterwards, or the offsets stop pointing at record starts.
pub fn build_lexicon(index_path: &Path, lexicon_path: &Path) -> Result<usize> {
    let mut reader = BufReader::new(File::open(index_path)?);
    let mut out = BufWriter::new(File::create(lexicon_path)?);
    let mut line = String::new();
    let mut offset = 0u64;
    let mut terms = 0usize;
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let start = offset;
        offset += read as u64;
        let body = line.trim();
        if body.is_empty() {
            continue;
        }
        let head: RecordHead = serde_json::from_str(body).map_err(|e| IndexError::corrupt(index_path, start, e))?;
        writeln!(out, "{}\t{}\t{}", head.term, start, head.df)?;
        terms += 1;
    }
    out.flush()?;
    tracing::info!(terms, lexicon = %lexicon_path.display(), "lexicon written");
    Ok(terms)
}

/// In-memory term directory used at query time.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, LexiconEntry>,
}

impl Lexicon {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut entries = HashMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (term, entry) = parse_row(&line).map_err(|reason| IndexError::CorruptLexicon {
                path: PathBuf::from(path),
                line: i + 1,
                reason,
            })?;
            entries.insert(term.to_string(), entry);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, term: &str) -> Option<LexiconEntry> {
        self.entries.get(term).copied()
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, LexiconEntry)> {
        self.entries.iter().map(|(t, e)| (t.as_str(), *e))
    }
}

fn parse_row(line: &str) -> std::result::Result<(&str, LexiconEntry), String> {
    let mut cols = line.split('\t');
    let (Some(term), Some(offset), Some(df), None) = (cols.next(), cols.next(), cols.next(), cols.next()) else {
        return Err(format!("expected 3 tab-separated columns in {line:?}"));
    };
    let offset = offset.parse::<u64>().map_err(|e| format!("bad offset {offset:?}: {e}"))?;
    let df = df.parse::<u32>().map_err(|e| format!("bad df {df:?}: {e}"))?;
    Ok((term, LexiconEntry { offset, df }))
}
