use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct Args {
    /// Run one pipeline pass and exit instead of serving HTTP.
    #[clap(long)]
    pub once: bool,

    /// Listen port, overrides PORT from the environment.
    #[clap(long)]
    pub port: Option<u16>,

    /// Slide images per run, overrides IMAGE_COUNT.
    #[clap(long)]
    pub images: Option<usize>,

    /// Artifact directory, overrides WORK_DIR.
    #[clap(long)]
    pub work_dir: Option<PathBuf>,
}
