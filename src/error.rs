use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single pipeline stage, carried back to the driver instead of
/// being logged and swallowed at the stage boundary.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("unexpected response from {service}: {detail}")]
    BadResponse {
        service: &'static str,
        detail: String,
    },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{tool} failed: {stderr}")]
    ToolFailed {
        tool: &'static str,
        stderr: String,
    },

    #[error("could not read media duration: {0}")]
    Probe(String),

    #[error("compose failed: {0}")]
    Compose(String),
}

/// The reportable stages of a run, in execution order: workspace setup
/// followed by the four pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Script,
    Voiceover,
    Images,
    Compose,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Script => "script",
            Stage::Voiceover => "voiceover",
            Stage::Images => "images",
            Stage::Compose => "compose",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failure annotated with which stage aborted the run.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn at(stage: Stage, source: StageError) -> Self {
        Self { stage, source }
    }
}
