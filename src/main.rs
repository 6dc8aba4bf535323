mod args;
mod audio;
mod caption;
mod config;
mod error;
mod images;
mod pipeline;
mod run;
mod script;
mod server;
mod tts;
mod video;

use clap::Parser;
use tracing::{error, info};

use crate::args::Args;
use crate::config::Config;
use crate::run::{RunId, RunPaths};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("info") // set to "debug" for more logs
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(images) = args.images {
        config.image_count = images;
    }
    if let Some(work_dir) = args.work_dir {
        config.work_dir = work_dir;
    }

    if args.once {
        info!("Starting single motivational clip run");
        let client = reqwest::Client::new();
        let run_id = RunId::new();
        let paths = RunPaths::create(&config.work_dir, run_id)?;
        info!("Run workspace: {}", paths.root().display());

        let result = pipeline::run_pipeline(&client, &config, &paths).await;
        paths.cleanup_intermediates();

        match result {
            Ok(report) => {
                info!("Video created: {}", report.video_path.display());
                Ok(())
            }
            Err(e) => {
                error!("Pipeline run {run_id} failed: {e}");
                std::process::exit(1);
            }
        }
    } else {
        info!("Starting motivclip server");
        server::serve(config).await
    }
}
