use anyhow::Context;
use std::path::PathBuf;

const DEFAULT_TEXT_API_URL: &str =
    "https://api-inference.huggingface.co/models/tiiuae/falcon-7b-instruct";
const DEFAULT_IMAGE_API_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2-1";
const DEFAULT_TTS_API_URL: &str = "https://ttsmp3.com/makemp3_new.php";

/// Runtime configuration, built once at startup and threaded through every
/// component. Components never read the process environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hugging Face inference API token.
    pub hf_token: String,
    /// HTTP listen port.
    pub port: u16,
    /// Base directory for per-run artifacts.
    pub work_dir: PathBuf,
    /// Text-generation endpoint.
    pub text_api_url: String,
    /// Image-diffusion endpoint.
    pub image_api_url: String,
    /// TTS endpoint (returns a JSON envelope with an MP3 URL).
    pub tts_api_url: String,
    /// Slides generated per run.
    pub image_count: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let hf_token = std::env::var("HF_TOKEN").context("HF_TOKEN must be set")?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let work_dir = std::env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp/motivclip"));

        let image_count = std::env::var("IMAGE_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        Ok(Self {
            hf_token,
            port,
            work_dir,
            text_api_url: std::env::var("TEXT_API_URL")
                .unwrap_or_else(|_| DEFAULT_TEXT_API_URL.to_string()),
            image_api_url: std::env::var("IMAGE_API_URL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_API_URL.to_string()),
            tts_api_url: std::env::var("TTS_API_URL")
                .unwrap_or_else(|_| DEFAULT_TTS_API_URL.to_string()),
            image_count,
        })
    }
}
