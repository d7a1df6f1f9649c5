use clap::Subcommand;
use std::path::PathBuf;

pub mod extract;
pub mod list;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a sound bank (or every bank under a directory) to WAV assets
    Extract {
        /// Source .zpp file or directory of banks
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory (defaults to a folder named after the bank)
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// List the clips and roles of a sound bank
    List {
        /// Source .zpp file
        #[arg(short, long)]
        source: PathBuf,

        /// Show per-clip roles
        #[arg(long)]
        detailed: bool,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Extract {
                source,
                destination,
            } => extract::execute(source, destination.as_deref()),
            Commands::List {
                source,
                detailed,
                json,
            } => list::execute(source, *detailed, *json),
        }
    }
}
