use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML config file.
    /// If not set, `CONFIG_PATH` is used, then `config.yaml`. A missing file means defaults.
    #[arg(short, long, value_name = "FILE", env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Port to listen on. Overrides both the config file and `PORT`.
    #[arg(short, long)]
    pub port: Option<u16>,
}
