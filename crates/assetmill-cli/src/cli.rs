use std::net::SocketAddr;
use std::path::PathBuf;

use assetmill_server::ForcePolicy;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "assetmill",
    about = "Build, cache and serve assets on demand",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the asset server
    Serve(ServeArgs),
    /// Build the artifact for one request path, as a GET would
    Build(BuildArgs),
    /// List the files a source list expands to, in walk order
    Sources(SourcesArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Request path, e.g. /js/app.js
    pub path: String,
    /// Override the configured force policy (always, never, if-newer)
    #[arg(long)]
    pub force: Option<ForcePolicy>,
}

#[derive(Args)]
pub struct SourcesArgs {
    /// Files or directories; defaults to the configured sources
    pub paths: Vec<PathBuf>,
    /// Only list files with these extensions
    #[arg(short, long = "ext")]
    pub extensions: Vec<String>,
}
