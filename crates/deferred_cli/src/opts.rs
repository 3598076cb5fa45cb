use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(name = "deferred_cli")]
#[command(bin_name = "deferred_cli")]
#[command(version, about, long_about = None)]
pub(crate) struct Opts {
    /// File to read
    pub(crate) path: PathBuf,

    #[command(flatten)]
    pub(crate) verbose: Verbosity<InfoLevel>,
}
