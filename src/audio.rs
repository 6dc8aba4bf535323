use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::StageError;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Duration of a media file in seconds, read with ffprobe. The voiceover is
/// an MP3, so the container header is the only reliable source.
pub async fn media_duration_seconds(path: &Path) -> Result<f64, StageError> {
    if !path.exists() {
        return Err(StageError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(StageError::ToolFailed {
            tool: "ffprobe",
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let probe: ProbeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| StageError::Probe(e.to_string()))?;

    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .ok_or_else(|| StageError::Probe("no duration in format section".to_string()))
}
