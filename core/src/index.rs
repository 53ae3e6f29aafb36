use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{IndexError, Result};

pub type DocId = u32;

/// Per-document occurrence record for one term.
///
/// `tf` is the sum of every zone count, body included; only the three boosted
/// zones are kept separately. On disk a posting is the 5-element array
/// `[doc_id, tf, title_tf, header_tf, bold_tf]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[u32; 5]", try_from = "[u32; 5]")]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
    pub title_tf: u32,
    pub header_tf: u32,
    pub bold_tf: u32,
}

impl Posting {
    /// Field-wise sum with another posting for the same document.
    pub fn absorb(&mut self, other: &Posting) {
        debug_assert_eq!(self.doc_id, other.doc_id);
        self.tf = self.tf.saturating_add(other.tf);
        self.title_tf = self.title_tf.saturating_add(other.title_tf);
        self.header_tf = self.header_tf.saturating_add(other.header_tf);
        self.bold_tf = self.bold_tf.saturating_add(other.bold_tf);
    }
}

impl From<Posting> for [u32; 5] {
    fn from(p: Posting) -> Self {
        [p.doc_id, p.tf, p.title_tf, p.header_tf, p.bold_tf]
    }
}

impl TryFrom<[u32; 5]> for Posting {
    type Error = String;

    fn try_from([doc_id, tf, title_tf, header_tf, bold_tf]: [u32; 5]) -> std::result::Result<Self, Self::Error> {
        let zoned = title_tf as u64 + header_tf as u64 + bold_tf as u64;
        if (tf as u64) < zoned {
            return Err(format!("posting for doc {doc_id} has tf {tf} below its zone counts ({zoned})"));
        }
        Ok(Posting { doc_id, tf, title_tf, header_tf, bold_tf })
    }
}

/// One line of a partial index file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub term: String,
    pub postings: Vec<Posting>, // sorted by doc_id
}

/// One line of the final index file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRecord {
    pub term: String,
    pub df: u32,
    pub postings: Vec<Posting>, // sorted by doc_id
}

impl FinalRecord {
    pub fn new(term: String, postings: Vec<Posting>) -> Self {
        Self { df: postings.len() as u32, term, postings }
    }

    /// Decode one line and check the record invariants: df matches the
    /// posting count and doc ids are strictly ascending.
    pub fn decode(line: &str, path: &Path, offset: u64) -> Result<Self> {
        let record: FinalRecord =
            serde_json::from_str(line.trim_end()).map_err(|e| IndexError::corrupt(path, offset, e))?;
        if record.df as usize != record.postings.len() {
            return Err(IndexError::corrupt(
                path,
                offset,
                format!("term {:?} has df {} but {} postings", record.term, record.df, record.postings.len()),
            ));
        }
        if !strictly_ascending(&record.postings) {
            return Err(IndexError::corrupt(path, offset, format!("postings for {:?} are not doc_id-ascending", record.term)));
        }
        Ok(record)
    }
}

pub(crate) fn strictly_ascending(postings: &[Posting]) -> bool {
    postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc_id: DocId, tf: u32, title_tf: u32, header_tf: u32, bold_tf: u32) -> Posting {
        Posting { doc_id, tf, title_tf, header_tf, bold_tf }
    }

    #[test]
    fn posting_encodes_as_five_tuple() {
        let json = serde_json::to_string(&posting(3, 7, 1, 2, 0)).unwrap();
        assert_eq!(json, "[3,7,1,2,0]");
    }

    #[test]
    fn posting_rejects_wrong_arity_and_negative_values() {
        assert!(serde_json::from_str::<Posting>("[1,2,0,0]").is_err());
        assert!(serde_json::from_str::<Posting>("[1,2,0,0,0,0]").is_err());
        assert!(serde_json::from_str::<Posting>("[1,-2,0,0,0]").is_err());
        assert!(serde_json::from_str::<Posting>("[1,2.5,0,0,0]").is_err());
    }

    #[test]
    fn posting_rejects_tf_below_zone_counts() {
        assert!(serde_json::from_str::<Posting>("[1,2,1,1,1]").is_err());
        assert!(serde_json::from_str::<Posting>("[1,3,1,1,1]").is_ok());
    }

    #[test]
    fn absorb_sums_every_field() {
        let mut a = posting(4, 3, 1, 0, 1);
        a.absorb(&posting(4, 5, 0, 2, 1));
        assert_eq!(a, posting(4, 8, 1, 2, 2));
    }

    #[test]
    fn final_record_layout() {
        let rec = FinalRecord::new("cat".into(), vec![posting(0, 4, 1, 0, 0)]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"term":"cat","df":1,"postings":[[0,4,1,0,0]]}"#);
    }

    #[test]
    fn decode_checks_df_and_order() {
        let path = Path::new("index_final.jsonl");
        assert!(FinalRecord::decode(r#"{"term":"a","df":1,"postings":[[0,1,0,0,0]]}"#, path, 0).is_ok());
        let bad_df = FinalRecord::decode(r#"{"term":"a","df":2,"postings":[[0,1,0,0,0]]}"#, path, 10);
        assert!(matches!(bad_df, Err(IndexError::CorruptRecord { offset: 10, .. })));
        let unsorted = FinalRecord::decode(r#"{"term":"a","df":2,"postings":[[3,1,0,0,0],[1,1,0,0,0]]}"#, path, 0);
        assert!(unsorted.is_err());
        assert!(FinalRecord::decode("{not json", path, 0).is_err());
    }
}
