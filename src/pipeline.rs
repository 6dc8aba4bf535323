use std::path::PathBuf;

use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::error::{PipelineError, Stage};
use crate::images::generate_images;
use crate::run::RunPaths;
use crate::script::generate_script;
use crate::tts::synthesize_voiceover;
use crate::video::compose_video;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub script: String,
    pub video_path: PathBuf,
}

/// Fixed sequence: script, voiceover, images, compose. Script and image
/// generation degrade to fallbacks on their own and never abort; a run
/// without narration or without a rendered file is aborted here with the
/// failing stage identified.
pub async fn run_pipeline(
    client: &Client,
    config: &Config,
    paths: &RunPaths,
) -> Result<PipelineReport, PipelineError> {
    info!(stage = %Stage::Script, "generating script");
    let script = generate_script(client, config).await;
    info!("Script: {script}");

    info!(stage = %Stage::Voiceover, "synthesizing voiceover");
    synthesize_voiceover(client, config, &script, paths)
        .await
        .map_err(|e| PipelineError::at(Stage::Voiceover, e))?;

    info!(stage = %Stage::Images, "generating slide images");
    let images = generate_images(client, config, &script, config.image_count, paths).await;
    info!("Prepared {} slide images", images.len());

    info!(stage = %Stage::Compose, "composing final video");
    let video_path = compose_video(&images, &script, paths)
        .await
        .map_err(|e| PipelineError::at(Stage::Compose, e))?;

    Ok(PipelineReport { script, video_path })
}
