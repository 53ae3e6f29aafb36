use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use zonedex_core::builder::DEFAULT_FLUSH_DOCS;
use zonedex_core::corpus::iter_json_docs;
use zonedex_core::merge::list_partials;
use zonedex_core::{build_lexicon, merge_partials, IndexBuilder, IndexConfig, IndexPaths, Zones};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a disk-resident inverted index over a JSON/HTML corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a corpus: partial indexes, k-way merge, lexicon and doc map
    Build {
        /// Corpus root; every *.json file below it is one page
        #[arg(long)]
        corpus: PathBuf,
        /// Output index directory
        #[arg(long, default_value = "./out")]
        out: PathBuf,
        /// Flush a partial index to disk every N documents
        #[arg(long, env = "ZONEDEX_FLUSH_DOCS", default_value_t = DEFAULT_FLUSH_DOCS)]
        flush_docs: usize,
        /// Disable stemming
        #[arg(long, default_value_t = false)]
        no_stem: bool,
    },
    /// Merge every partial index in a directory into one final index
    Merge {
        /// Directory holding partial_NNNN.jsonl files
        #[arg(long)]
        partials: PathBuf,
        /// Final index path
        #[arg(long)]
        out: PathBuf,
    },
    /// Rebuild the term -> (offset, df) lexicon of a final index
    Lexicon {
        /// Final index path
        #[arg(long)]
        index: PathBuf,
        /// Output lexicon path
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, out, flush_docs, no_stem } => build_index(&corpus, &out, flush_docs, !no_stem),
        Commands::Merge { partials, out } => {
            let paths = list_partials(&partials)?;
            if paths.is_empty() {
                bail!("no partial indexes found in {}", partials.display());
            }
            let terms = merge_partials(paths.as_slice(), &out)?;
            println!("Merged {} partials into {} ({} unique terms)", paths.len(), out.display(), terms);
            Ok(())
        }
        Commands::Lexicon { index, out } => {
            if let Some(dir) = out.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let terms = build_lexicon(&index, &out)?;
            println!("Lexicon written to: {}", out.display());
            println!("Unique terms: {terms}");
            Ok(())
        }
    }
}

fn build_index(corpus: &Path, out: &Path, flush_docs: usize, stem: bool) -> Result<()> {
    // validate before touching the disk
    let config = IndexConfig::new(flush_docs, stem)?;
    if !corpus.is_dir() {
        bail!("corpus root {} is not a directory", corpus.display());
    }
    let mut builder = IndexBuilder::create(IndexPaths::new(out), config)?;

    for doc in iter_json_docs(corpus) {
        let doc_id = builder.add_document(doc.url, &Zones::extract(&doc.content))?;
        if (doc_id + 1) % 1000 == 0 {
            tracing::info!(docs = doc_id + 1, "indexing progress");
        }
    }

    let summary = builder.finish()?;
    println!("=== Analytics ===");
    println!("Indexed documents: {}", summary.indexed_documents);
    println!("Unique tokens:     {}", summary.unique_terms);
    println!("Index size (KB):   {:.2}", summary.index_size_kb);
    println!("Final index:       {}", summary.final_index.display());
    println!("Lexicon:           {}", summary.lexicon.display());
    println!("Doc map:           {}", summary.doc_map.display());
    println!("Partials:          {}", summary.partials.len());
    println!("Stemming:          {}", config.stem());
    tracing::debug!(summary = %serde_json::to_string(&summary)?, "build summary");
    Ok(())
}
