use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Identifier for one pipeline run. Every artifact path is namespaced under
/// it, so concurrent runs never touch each other's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-run artifact layout under `{work_dir}/runs/{run_id}/`.
#[derive(Debug, Clone)]
pub struct RunPaths {
    root: PathBuf,
}

impl RunPaths {
    pub fn create(work_dir: &Path, id: RunId) -> std::io::Result<Self> {
        let root = work_dir.join("runs").join(id.to_string());
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn voice(&self) -> PathBuf {
        self.root.join("voice.mp3")
    }

    pub fn image(&self, index: usize) -> PathBuf {
        self.root.join(format!("image_{index}.png"))
    }

    /// Placeholder slide used when image generation fails.
    pub fn placeholder(&self) -> PathBuf {
        self.root.join("default.png")
    }

    pub fn caption(&self) -> PathBuf {
        self.root.join("caption.txt")
    }

    pub fn slides(&self) -> PathBuf {
        self.root.join("slides.txt")
    }

    pub fn video(&self) -> PathBuf {
        self.root.join("final.mp4")
    }

    /// Delete everything in the run directory except the final video.
    /// Best-effort: a leftover temp file is not worth failing a run over.
    pub fn cleanup_intermediates(&self) {
        let keep = self.video();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not list run dir {} for cleanup: {}", self.root.display(), e);
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path == keep {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}
