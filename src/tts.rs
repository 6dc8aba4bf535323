use std::path::PathBuf;

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::StageError;
use crate::run::RunPaths;

const TTS_VOICE: &str = "Maxim";
const TTS_SOURCE: &str = "ttsmp3";

/// The service answers with a JSON envelope pointing at the rendered file;
/// the audio itself needs a second fetch. On errors it still returns 200
/// with an `Error` field instead of an `MP3` URL.
#[derive(Debug, Deserialize)]
struct TtsResponse {
    #[serde(rename = "MP3")]
    mp3: Option<String>,
    #[serde(rename = "Error")]
    error: Option<serde_json::Value>,
}

/// Synthesize the script and write the MP3 to the run's voice path,
/// overwriting any previous attempt. Unlike the other generation stages this
/// one has no usable fallback, so failures surface to the driver.
pub async fn synthesize_voiceover(
    client: &Client,
    config: &Config,
    text: &str,
    paths: &RunPaths,
) -> Result<PathBuf, StageError> {
    let res = client
        .post(&config.tts_api_url)
        .form(&[("msg", text), ("lang", TTS_VOICE), ("source", TTS_SOURCE)])
        .send()
        .await?
        .error_for_status()?;

    let envelope: TtsResponse = res.json().await?;
    let mp3_url = envelope
        .mp3
        .filter(|url| !url.is_empty())
        .ok_or_else(|| StageError::BadResponse {
            service: "ttsmp3",
            detail: match envelope.error {
                Some(e) => e.to_string(),
                None => "response had no MP3 field".to_string(),
            },
        })?;

    info!("Fetching synthesized audio from {mp3_url}");
    let audio = client
        .get(&mp3_url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let out = paths.voice();
    tokio::fs::write(&out, &audio).await?;
    info!("Voiceover written to {} ({} bytes)", out.display(), audio.len());
    Ok(out)
}
