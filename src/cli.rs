use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(about = "Mines vulnerability-fixing commits into a labeled Java snippet dataset")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output format (json, terminal)
    #[arg(short, long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Write the run report to a file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full extraction pipeline over a commit dump and write a
    /// split dataset
    Extract {
        /// JSON-lines commit dump (one commit record per line)
        source: String,

        /// Directory for the split files and statistics
        #[arg(long, default_value = "dataset")]
        out_dir: String,

        /// Custom category rule table (YAML)
        #[arg(long)]
        rules: Option<String>,

        /// Minimum normalized length delta between before and after texts
        #[arg(long)]
        min_change_delta: Option<usize>,

        /// Acceptance threshold for the confidence score
        #[arg(long)]
        confidence_threshold: Option<f64>,

        /// Keep every qualifying file of a commit instead of one sample
        /// per commit
        #[arg(long)]
        keep_per_file: bool,
    },

    /// Balance an emitted dataset by deriving label-preserving variants
    Augment {
        /// Dataset directory holding train/val/test split files
        dataset_dir: String,

        /// Grow each category to this many samples
        #[arg(long)]
        target_per_category: usize,

        /// Custom category rule table (YAML)
        #[arg(long)]
        rules: Option<String>,
    },

    /// Recheck an emitted dataset against the published invariants
    Verify {
        /// Dataset directory holding train/val/test split files
        dataset_dir: String,

        /// Allow augmented variants, which share their origin's commit hash
        #[arg(long)]
        augmented: bool,

        /// Custom category rule table (YAML)
        #[arg(long)]
        rules: Option<String>,
    },
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output for machine consumption
    Json,
    /// Human-readable terminal output
    Terminal,
}
