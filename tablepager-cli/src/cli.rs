use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Parser)]
#[command(
    name = "tablepager",
    about = "Serve a product catalog and page through it",
    version
)]
pub struct Cli {
    /// Write logs to this file instead of stderr.
    #[arg(long, global = true, env = "TABLEPAGER_LOG")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the catalog until interrupted.
    Serve {
        /// JSON array of products.
        #[arg(long, default_value = "tablepager-cli/data/products.json")]
        products: PathBuf,
        /// Listen address.
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
    /// Serve the catalog on a free port and print it page by page.
    Browse {
        /// JSON array of products.
        #[arg(long, default_value = "tablepager-cli/data/products.json")]
        products: PathBuf,
        /// Table config as JSON (page_size, debounce_ms, filter_mode).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Rows per page (5, 10 or 20). Overrides the config file.
        #[arg(long)]
        page_size: Option<u32>,
        /// Only show products whose title contains this text.
        #[arg(long)]
        title: Option<String>,
        /// Only show products whose category contains this text.
        #[arg(long)]
        category: Option<String>,
        /// Stop after this many pages.
        #[arg(long)]
        max_pages: Option<usize>,
    },
}
