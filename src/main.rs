//! # Landmark Store CLI (`lmstore`)
//!
//! Starts the sample store server.
//!
//! ## Usage
//!
//! ```bash
//! lmstore                              # ./training-data, port 8000
//! lmstore "$HOME/.config/MyApp"        # $HOME/.config/MyApp/training-data
//! lmstore --verbose --port 9000
//! lmstore --config ./lmstore.toml
//! ```
//!
//! A host application reads the bound port from the first stdout line,
//! `Server running at http://localhost:<port>/`.

use clap::Parser;
use std::path::PathBuf;

use landmark_store::config::{self, Config, Overrides};
use landmark_store::{logging, server};

/// Landmark Store — saves gesture-landmark training samples as JSON files
/// and serves them back for training.
#[derive(Parser)]
#[command(name = "lmstore", version)]
struct Cli {
    /// User-data directory. Samples are stored in `<DATA_DIR>/training-data`.
    ///
    /// Defaults to `./training-data` in the working directory.
    data_dir: Option<PathBuf>,

    /// Log every request.
    #[arg(long)]
    verbose: bool,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to try first; successive ports are tried while it is taken.
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Directory with the front-end assets. Defaults to the directory
    /// containing this executable.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let base = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let cfg = base.with_overrides(Overrides {
        user_data_dir: cli.data_dir,
        host: cli.host,
        port: cli.port,
        static_dir: cli.static_dir,
    });
    cfg.validate()?;

    server::run_server(&cfg).await
}
