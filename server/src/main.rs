use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};
use zonedex_core::{IndexPaths, SearchEngine, SearchOptions};

/// Queries run by `batch` when no query file is given.
const DEFAULT_QUERIES: &[&str] = &["cristina lopes", "machine learning", "ACM", "master of software engineering"];

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "AND-only ranked search over a disk-resident index")]
struct Cli {
    /// Index directory path
    #[arg(long, global = true, default_value = "./out")]
    index: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct QueryFlags {
    /// Top K results to return
    #[arg(long, default_value_t = 10)]
    topk: usize,
    /// Disable TF-IDF ranking (unsorted AND results)
    #[arg(long, default_value_t = false)]
    no_rank: bool,
    /// Disable stemming of query terms
    #[arg(long, default_value_t = false)]
    no_stem: bool,
}

impl QueryFlags {
    /// Query terms are only stemmed when the index was built that way.
    fn options(self, engine: &SearchEngine) -> SearchOptions {
        let stem = !self.no_stem && engine.index_stemmed().unwrap_or(true);
        SearchOptions { top_k: self.topk, rank: !self.no_rank, stem, ..Default::default() }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP search API
    Serve {
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run a single query and print the results
    Query {
        query: String,
        #[command(flatten)]
        flags: QueryFlags,
    },
    /// Read queries from stdin until an empty line
    Interactive {
        #[command(flatten)]
        flags: QueryFlags,
    },
    /// Run a list of queries and report the top URLs of each
    Batch {
        /// File with one query per line; defaults to the reference queries
        #[arg(long)]
        queries: Option<PathBuf>,
        /// Number of URLs to keep per query
        #[arg(long, default_value_t = 5)]
        topk: usize,
        /// Write {query: [urls]} JSON here
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let engine = SearchEngine::open(&IndexPaths::new(&cli.index))?;

    match cli.command {
        Commands::Serve { host, port } => {
            let app = server::router(Arc::new(engine));
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, index = %cli.index, "server listening");
            axum::serve(listener, app).await?;
        }
        Commands::Query { query, flags } => print_results(&engine, &query, flags)?,
        Commands::Interactive { flags } => interactive(&engine, flags)?,
        Commands::Batch { queries, topk, out } => batch(&engine, queries, topk, out)?,
    }
    Ok(())
}

fn print_results(engine: &SearchEngine, query: &str, flags: QueryFlags) -> Result<()> {
    let outcome = engine.search(query, &flags.options(engine))?;
    if outcome.hits.is_empty() {
        println!("(no results)");
    }
    for (i, hit) in outcome.hits.iter().enumerate() {
        println!("{:02}. {}\t{:.6}", i + 1, hit.url.as_deref().unwrap_or("?"), hit.score);
    }
    Ok(())
}

fn interactive(engine: &SearchEngine, flags: QueryFlags) -> Result<()> {
    println!("=== Search Interface (AND-only) ===");
    println!("Type a query (space-separated terms). Empty line to quit.");
    println!("Ranking: {} | Stem: {}", if flags.no_rank { "OFF" } else { "TF-IDF" }, flags.options(engine).stem);
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("\nquery> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }
        print_results(engine, query, flags)?;
    }
    Ok(())
}

fn batch(engine: &SearchEngine, queries: Option<PathBuf>, topk: usize, out: Option<PathBuf>) -> Result<()> {
    let queries: Vec<String> = match queries {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        None => DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
    };
    let opts = SearchOptions { top_k: topk, stem: engine.index_stemmed().unwrap_or(true), ..Default::default() };

    let mut all: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for q in queries {
        let outcome = engine.search(&q, &opts)?;
        let urls: Vec<String> = outcome.hits.into_iter().filter_map(|h| h.url).collect();
        println!("\n==============================");
        println!("Query: {q}");
        for (i, u) in urls.iter().enumerate() {
            println!("{}. {}", i + 1, u);
        }
        all.insert(q, urls);
    }

    if let Some(path) = out {
        std::fs::write(&path, serde_json::to_string_pretty(&all)?)?;
        println!("\nSaved results JSON to: {}", path.display());
    }
    Ok(())
}
