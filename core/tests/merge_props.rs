use proptest::prelude::*;
use std::fs;

use zonedex_core::partial::PartialIndex;
use zonedex_core::{merge_partials, FinalRecord, Tokenizer, Zones};

fn zones_strategy() -> impl Strategy<Value = Zones> {
    let words = prop::sample::select(vec!["ant", "bee", "cow", "doe", "eel", "fox", "gnu"]);
    let text = prop::collection::vec(words, 0..6).prop_map(|w| w.join(" "));
    (text.clone(), text.clone(), text).prop_map(|(title, bold, rest)| Zones {
        body: format!("{title} {bold} {rest}"),
        title,
        bold,
        ..Default::default()
    })
}

fn as_final(index: PartialIndex) -> Vec<FinalRecord> {
    index.into_sorted_records().into_iter().map(|r| FinalRecord::new(r.term, r.postings)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn merging_batches_equals_indexing_everything(
        docs in prop::collection::vec(zones_strategy(), 1..20),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let tok = Tokenizer::new(false);
        let mut bounds: Vec<usize> = cuts.iter().map(|c| c.index(docs.len() + 1)).collect();
        bounds.push(0);
        bounds.push(docs.len());
        bounds.sort_unstable();
        bounds.dedup();

        let dir = tempfile::tempdir().unwrap();
        let mut partials = Vec::new();
        for (seq, w) in bounds.windows(2).enumerate() {
            let mut batch = PartialIndex::new();
            for doc_id in w[0]..w[1] {
                batch.add_document(doc_id as u32, &docs[doc_id], &tok);
            }
            let path = dir.path().join(format!("partial_{seq:04}.jsonl"));
            batch.write_to(&path).unwrap();
            partials.push(path);
        }
        let out = dir.path().join("index_final.jsonl");
        let terms = merge_partials(partials.as_slice(), &out).unwrap();

        let mut whole = PartialIndex::new();
        for (doc_id, z) in docs.iter().enumerate() {
            whole.add_document(doc_id as u32, z, &tok);
        }
        let expected = as_final(whole);

        let merged: Vec<FinalRecord> = fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(|l| FinalRecord::decode(l, &out, 0).unwrap())
            .collect();
        prop_assert_eq!(terms, expected.len());
        prop_assert_eq!(merged, expected);
    }
}
