pub use clap::Parser;

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "hashgate")]
#[command(about = "Content-addressable file gateway")]
pub struct Args {
    /// Path to the hashgate config directory (defaults to ~/.hashgate)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the config directory with a default config
    Init,
    /// Run the gateway service
    Serve,
    /// Print version information
    Version,
}
