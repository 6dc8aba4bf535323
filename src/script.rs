use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::Config;

/// Used whenever the model cannot deliver. A clip with a stock phrase beats
/// no clip at all.
pub const FALLBACK_SCRIPT: &str = "Heute ist dein Tag!";

const SCRIPT_PROMPT: &str =
    "Erstelle ein kurzes, motivierendes TikTok-Skript auf Deutsch (max. 50 Wörter).";

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Ask the text model for a short motivational script. Never fails: any
/// upstream problem is logged once and masked with the fallback phrase,
/// so the result is always a non-empty string.
pub async fn generate_script(client: &Client, config: &Config) -> String {
    match request_script(client, config).await {
        Ok(text) => {
            info!("Generated script ({} chars)", text.len());
            text
        }
        Err(e) => {
            error!("Script generation failed, using fallback: {e:#}");
            FALLBACK_SCRIPT.to_string()
        }
    }
}

async fn request_script(client: &Client, config: &Config) -> anyhow::Result<String> {
    let res = client
        .post(&config.text_api_url)
        .bearer_auth(&config.hf_token)
        .json(&serde_json::json!({ "inputs": SCRIPT_PROMPT }))
        .send()
        .await?
        .error_for_status()?;

    let candidates: Vec<GeneratedText> = res.json().await?;
    let raw = candidates
        .first()
        .map(|c| c.generated_text.as_str())
        .unwrap_or_default();

    let text = tidy_script(raw);
    if text.is_empty() {
        anyhow::bail!("model returned no usable text");
    }
    Ok(text)
}

/// The inference endpoint echoes the prompt in front of the completion;
/// strip it and collapse the model's line breaks into one caption-friendly line.
fn tidy_script(raw: &str) -> String {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix(SCRIPT_PROMPT).unwrap_or(trimmed);
    let ws = Regex::new(r"\s+").unwrap();
    ws.replace_all(body.trim(), " ").into_owned()
}
