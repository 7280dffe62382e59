//! # genomevec CLI
//!
//! Run with: `cargo run --bin genomevec -- query states.csv 1200 --gff genome.gff3`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use genomevec_core::{
    Config, IndexMode, LogLevel, DEFAULT_NLIST, QUERY_PREVIEW_SIZE, SEARCH_PREVIEW_SIZE,
};
use genomevec_query::{
    commands, load_matrix, render_preview, render_query_vector, write_results_file, ResultSet,
};

#[derive(Parser)]
#[command(name = "genomevec")]
#[command(about = "Similarity search over per-position genomic embeddings")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a matrix file and save it
    Index {
        /// Embedding matrix (CSV, one row per position)
        matrix: PathBuf,
        /// Where to write the index
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        mode: ModeArgs,
    },
    /// Write the row at a position as a query vector file
    Extract {
        matrix: PathBuf,
        /// 1-based position
        position: i64,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Search a saved index with a query vector file
    Search {
        index: PathBuf,
        /// Query vector file with a `Value` column
        query: PathBuf,
        /// Result file (CSV, ordered by position)
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Build an in-memory index and find positions similar to one position
    Query {
        matrix: PathBuf,
        /// 1-based position
        position: i64,
        /// Optional result file (CSV, ordered by position)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep the queried position in the results
        #[arg(long)]
        include_self: bool,
        #[command(flatten)]
        mode: ModeArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct ModeArgs {
    /// Use the clustered (approximate) index
    #[arg(long)]
    clustered: bool,
    /// Number of clusters
    #[arg(long, requires = "clustered")]
    nlist: Option<usize>,
}

#[derive(Args)]
struct SearchArgs {
    /// GFF3 annotation file
    #[arg(long)]
    gff: Option<PathBuf>,
    /// Number of results (default: every position)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
    /// Clusters probed per query (clustered indexes only)
    #[arg(long)]
    nprobe: Option<usize>,
    /// Number of hits printed (default: 30 for `search`, 5 for `query`)
    #[arg(long)]
    preview: Option<usize>,
    /// Keep whole-sequence `region` features
    #[arg(long)]
    keep_region: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level(&config, cli.verbose, cli.quiet))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Index {
            matrix,
            output,
            mode,
        } => {
            mode.apply(&mut config)?;
            let index = commands::build_index_file(&matrix, &output, &config)
                .with_context(|| format!("building index from {}", matrix.display()))?;
            println!(
                "Indexed {} positions (dim={}, mode={}) -> {}",
                index.len(),
                index.dimension(),
                index.mode().name(),
                output.display()
            );
        }
        Commands::Extract {
            matrix,
            position,
            output,
        } => {
            let row = commands::extract_row(&matrix, position, &output, &config)
                .with_context(|| format!("extracting position {}", position))?;
            println!(
                "Wrote position {} ({} values) to {}",
                position,
                row.len(),
                output.display()
            );
        }
        Commands::Search {
            index,
            query,
            output,
            search,
        } => {
            search.apply(&mut config);
            let annotations = commands::load_annotations(search.gff.as_deref(), &config)?;
            let results =
                commands::search_file(&index, &query, annotations.as_ref(), &output, &config)
                    .with_context(|| format!("searching {}", index.display()))?;
            report(&results, config.search.preview_size_or(SEARCH_PREVIEW_SIZE), Some(&output));
        }
        Commands::Query {
            matrix,
            position,
            output,
            include_self,
            mode,
            search,
        } => {
            mode.apply(&mut config)?;
            search.apply(&mut config);
            if include_self {
                config.search.exclude_self = false;
            }
            let annotations = commands::load_annotations(search.gff.as_deref(), &config)?;

            info!("Querying position {} of {}", position, matrix.display());
            config.validate()?;
            let vectors = load_matrix(&matrix, &config.input)
                .with_context(|| format!("loading {}", matrix.display()))?;
            let query = vectors
                .position(position)
                .with_context(|| format!("querying position {}", position))?;
            println!("{}", render_query_vector(position, query));

            let results =
                commands::query_matrix_position(&vectors, position, annotations.as_ref(), &config)
                    .with_context(|| format!("querying position {}", position))?;
            if let Some(path) = &output {
                write_results_file(path, &results)?;
            }
            report(&results, config.search.preview_size_or(QUERY_PREVIEW_SIZE), output.as_deref());
        }
    }

    Ok(())
}

impl ModeArgs {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if !self.clustered {
            return Ok(());
        }
        let nlist = self.nlist.unwrap_or(match config.index.mode {
            IndexMode::Clustered { nlist, .. } => nlist,
            IndexMode::Exact => DEFAULT_NLIST,
        });
        let nprobe = match config.index.mode {
            IndexMode::Clustered { nprobe, .. } => nprobe,
            IndexMode::Exact => nlist,
        };
        config.index.mode = IndexMode::clustered(nlist, nprobe)?;
        Ok(())
    }
}

impl SearchArgs {
    fn apply(&self, config: &mut Config) {
        if self.top_k.is_some() {
            config.search.top_k = self.top_k;
        }
        if self.nprobe.is_some() {
            config.search.nprobe = self.nprobe;
        }
        if let Some(preview) = self.preview {
            config.search.preview_size = Some(preview);
        }
        if self.keep_region {
            config.annotation.skip_region = false;
        }
    }
}

fn report(results: &ResultSet, preview_size: usize, output: Option<&Path>) {
    println!("Top {} similar positions:", preview_size.min(results.len()));
    let preview = render_preview(results, preview_size);
    if !preview.is_empty() {
        println!("{}", preview);
    }
    if let Some(path) = output {
        println!("Full results ({} rows) written to {}", results.len(), path.display());
    }
}

fn log_level(config: &Config, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => match config.logging.level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        },
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
