use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::audio::media_duration_seconds;
use crate::caption::write_caption_file;
use crate::error::StageError;
use crate::run::RunPaths;

pub const FRAME_WIDTH: u32 = 1080;
pub const FRAME_HEIGHT: u32 = 1920;

const SECONDS_PER_IMAGE: f64 = 3.0;
const CAPTION_FONT_SIZE: u32 = 50;
const CAPTION_WRAP_COLUMNS: usize = 28;
const VIDEO_BITRATE: &str = "1000k";
const FRAME_RATE: &str = "30";

/// Render slideshow, caption and voiceover into the final MP4 in one ffmpeg
/// pass. The clip runs exactly as long as the audio; the slide loop is
/// repeated if the narration outlasts it and trimmed if it doesn't.
///
/// A missing voiceover file is rejected up front: nothing is rendered and any
/// previous output stays untouched.
pub async fn compose_video(
    images: &[PathBuf],
    script: &str,
    paths: &RunPaths,
) -> Result<PathBuf, StageError> {
    let audio = paths.voice();
    if !audio.exists() {
        return Err(StageError::FileNotFound(audio));
    }
    if images.is_empty() {
        return Err(StageError::Compose("no slide images to render".to_string()));
    }

    let audio_duration = media_duration_seconds(&audio).await?;
    info!("Voiceover duration: {audio_duration:.2}s");

    let slides = paths.slides();
    write_slide_list(&slides, images, audio_duration)?;

    let caption = paths.caption();
    write_caption_file(&caption, script, CAPTION_WRAP_COLUMNS)?;

    let out = paths.video();
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,\
         drawtext=textfile={caption}:fontsize={size}:fontcolor=white:\
         box=1:boxcolor=black:boxborderw=18:x=(w-text_w)/2:y=(h-text_h)/2",
        w = FRAME_WIDTH,
        h = FRAME_HEIGHT,
        caption = caption.display(),
        size = CAPTION_FONT_SIZE,
    );

    info!("Rendering final video to {}", out.display());
    let output = Command::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&slides)
        .arg("-i")
        .arg(&audio)
        .args(["-vf", &filter])
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-b:v", VIDEO_BITRATE])
        .args(["-c:a", "aac", "-r", FRAME_RATE])
        .args(["-t", &format!("{audio_duration:.3}")])
        .arg(&out)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(StageError::ToolFailed {
            tool: "ffmpeg",
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    if !out.exists() {
        return Err(StageError::Compose(
            "ffmpeg exited cleanly but wrote no output".to_string(),
        ));
    }

    info!("Final video written to {}", out.display());
    Ok(out)
}

/// ffconcat list with one fixed-duration entry per image, the whole sequence
/// repeated until it covers the audio; ffmpeg trims the overshoot with -t.
/// The concat demuxer needs the last file restated so the final entry's
/// duration sticks.
fn write_slide_list(
    path: &Path,
    images: &[PathBuf],
    audio_duration: f64,
) -> Result<(), StageError> {
    for img in images {
        if !img.exists() {
            return Err(StageError::FileNotFound(img.clone()));
        }
    }

    let per_pass = images.len() as f64 * SECONDS_PER_IMAGE;
    let passes = (audio_duration / per_pass).ceil().max(1.0) as usize;

    let mut f = File::create(path)?;
    writeln!(f, "ffconcat version 1.0")?;
    for _ in 0..passes {
        for img in images {
            writeln!(f, "file '{}'", img.display())?;
            writeln!(f, "duration {SECONDS_PER_IMAGE}")?;
        }
    }
    if let Some(last) = images.last() {
        writeln!(f, "file '{}'", last.display())?;
    }
    Ok(())
}
