use anyhow::Result;
use clap::{Parser, Subcommand};
use movie_core::persist::{load_index, load_meta, save_index, save_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use movie_core::{build_with, BuildOptions, Recommender, WeightingParams};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

mod input;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the movie similarity index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a JSON/JSONL feature table (file or directory)
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Vocabulary cap, most frequent terms first; 0 keeps every term
        #[arg(long, default_value_t = movie_core::builder::DEFAULT_MAX_FEATURES)]
        max_features: usize,
        /// Use idf = ln(N/df) + 1 instead of the smoothed ln((1+N)/(1+df)) + 1
        #[arg(long, default_value_t = false)]
        no_smooth_idf: bool,
        /// Use tf = 1 + ln(count) instead of the raw count
        #[arg(long, default_value_t = false)]
        sublinear_tf: bool,
    },
    /// Print recommendations for a title from a built index
    Recommend {
        #[arg(long)]
        index: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Show the build metadata of an index
    Inspect {
        #[arg(long)]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, max_features, no_smooth_idf, sublinear_tf } => {
            let options = BuildOptions {
                max_features: (max_features > 0).then_some(max_features),
                weighting: WeightingParams { smooth_idf: !no_smooth_idf, sublinear_tf },
            };
            build_index(&input, &output, &options)
        }
        Commands::Recommend { index, title, k } => recommend(&index, &title, k),
        Commands::Inspect { index } => {
            let meta = load_meta(&IndexPaths::new(index))?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
            Ok(())
        }
    }
}

fn build_index(input: &str, output: &str, options: &BuildOptions) -> Result<()> {
    let rows = input::load_rows(Path::new(input))?;
    let index = build_with(rows, options)?;

    let out_paths = IndexPaths::new(output);
    save_index(&out_paths, &index)?;
    let meta = MetaFile {
        num_rows: index.len(),
        num_terms: index.dimension(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output, rows = meta.num_rows, terms = meta.num_terms, "index build complete");
    Ok(())
}

fn recommend(index_dir: &str, title: &str, k: usize) -> Result<()> {
    let recommender = Recommender::new(load_index(&IndexPaths::new(index_dir))?);
    let position = recommender.resolve(title)?;
    if let Some(row) = recommender.index().row(position) {
        println!("Recommendations for: {}", row.title);
    }
    for hit in recommender.neighbors_of(position, k) {
        println!("- {} ({:.3})", hit.row.title, hit.score);
    }
    Ok(())
}
