use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use tripstats::{run_analyze, run_idf, AnalyzeOptions};

#[derive(Parser)]
#[command(name = "tripstats")]
#[command(about = "Descriptive statistics for query/passage/triple ranking datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analysis and write the report files
    Analyze {
        /// Passages table (file or directory of .jsonl/.json/.tsv)
        #[arg(long)]
        docs: PathBuf,
        /// Queries table
        #[arg(long)]
        queries: PathBuf,
        /// Triples table
        #[arg(long)]
        triples: PathBuf,
        /// JSON file with analysis constants
        #[arg(long)]
        config: Option<PathBuf>,
        /// Size of the top-k token tables
        #[arg(long)]
        top_k: Option<usize>,
        /// Overlap denominator epsilon
        #[arg(long)]
        epsilon: Option<f64>,
        /// Histogram bins
        #[arg(long)]
        bins: Option<usize>,
        /// Output directory
        #[arg(long, default_value = "./analysis")]
        output: PathBuf,
        /// Snapshot directory; reused when present, written otherwise
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Keep per-triple overlap rows in report.json
        #[arg(long, default_value_t = false)]
        include_rows: bool,
    },
    /// Print smoothed IDF scores for the given tokens
    Idf {
        /// Passages table (file or directory)
        #[arg(long)]
        docs: PathBuf,
        /// JSON file with analysis constants
        #[arg(long)]
        config: Option<PathBuf>,
        /// Tokens to score
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { docs, queries, triples, config, top_k, epsilon, bins, output, cache, include_rows } => {
            let opts = AnalyzeOptions { docs, queries, triples, config, top_k, epsilon, bins, output, cache, include_rows };
            let summary = run_analyze(&opts)?;
            tracing::info!(output = %summary.output.display(), triples = summary.triples, "analysis written");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Idf { docs, config, tokens } => {
            let scores = run_idf(&docs, &tokens, config.as_deref())?;
            for (token, score) in scores {
                println!("{token}\t{score:.3}");
            }
        }
    }
    Ok(())
}
