pub mod builder;
pub mod corpus;
pub mod error;
pub mod index;
pub mod lexicon;
pub mod merge;
pub mod partial;
pub mod persist;
pub mod search;
pub mod tokenizer;
pub mod zones;

pub use error::{IndexError, Result};
pub use index::{DocId, FinalRecord, PartialRecord, Posting};

pub use builder::{BuildSummary, IndexBuilder, IndexConfig};
pub use lexicon::{build_lexicon, Lexicon, LexiconEntry};
pub use merge::merge_partials;
pub use persist::{DocMap, IndexPaths};
pub use search::{SearchEngine, SearchHit, SearchOptions, SearchOutcome};
pub use tokenizer::Tokenizer;
pub use zones::Zones;
