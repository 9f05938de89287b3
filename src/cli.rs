use std::path::PathBuf;

use clap::Parser;

/// syncserve - directory synchronization server
#[derive(Parser, Debug)]
#[command(name = "syncserve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory tree to serve (the sync root)
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Address to bind (overrides the config file)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Command schema file (JSON); defaults to the built-in command set
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
