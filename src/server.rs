use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Stage;
use crate::pipeline::{run_pipeline, PipelineReport};
use crate::run::{RunId, RunPaths};

/// Lifecycle of one triggered run. `Completed` carries the rendered file and
/// the script it narrates, `Failed` names the stage that aborted the run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed { video_path: String, script: String },
    Failed { stage: String, message: String },
}

#[derive(Serialize)]
struct JobView {
    job_id: Uuid,
    #[serde(flatten)]
    status: JobStatus,
}

/// Shared application state: config, one reqwest client, and the in-memory
/// job registry. Jobs live as long as the process; there is no durable queue.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    client: reqwest::Client,
    jobs: Arc<Mutex<HashMap<Uuid, JobStatus>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn set_status(&self, id: Uuid, status: JobStatus) {
        self.jobs.lock().unwrap().insert(id, status);
    }

    pub fn status(&self, id: &Uuid) -> Option<JobStatus> {
        self.jobs.lock().unwrap().get(id).cloned()
    }

    /// Register a job and run the pipeline on a background task. Returns the
    /// job id immediately; callers poll `GET /runs/{id}` for the outcome.
    pub fn spawn_run(&self) -> Uuid {
        let run_id = RunId::new();
        let job_id = run_id.uuid();
        self.set_status(job_id, JobStatus::Queued);

        let state = self.clone();
        tokio::spawn(async move {
            state.set_status(job_id, JobStatus::Running);
            match execute_run(&state, run_id).await {
                Ok(report) => {
                    let video_path = report.video_path.display().to_string();
                    info!("Run {run_id} completed: {video_path}");
                    state.set_status(
                        job_id,
                        JobStatus::Completed {
                            video_path,
                            script: report.script,
                        },
                    );
                }
                Err((stage, message)) => {
                    error!("Run {run_id} failed in {stage}: {message}");
                    state.set_status(job_id, JobStatus::Failed { stage, message });
                }
            }
        });
        job_id
    }
}

async fn execute_run(
    state: &AppState,
    run_id: RunId,
) -> Result<PipelineReport, (String, String)> {
    let paths = RunPaths::create(&state.config.work_dir, run_id)
        .map_err(|e| (Stage::Setup.to_string(), e.to_string()))?;

    let result = run_pipeline(&state.client, &state.config, &paths).await;
    paths.cleanup_intermediates();

    result.map_err(|e| (e.stage.to_string(), e.to_string()))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/runs", post(start_run))
        .route("/runs/:job_id", get(run_status))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn start_run(State(state): State<AppState>) -> impl IntoResponse {
    let job_id = state.spawn_run();
    info!("Accepted pipeline run {job_id}");
    (
        StatusCode::ACCEPTED,
        Json(JobView {
            job_id,
            status: JobStatus::Queued,
        }),
    )
}

async fn run_status(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> Response {
    match state.status(&job_id) {
        Some(status) => Json(JobView { job_id, status }).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "status": "error",
                "message": format!("unknown job {job_id}"),
            })),
        )
            .into_response(),
    }
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(work_dir: &std::path::Path) -> AppState {
        // Endpoints point at a closed local port so a spawned run fails fast
        // instead of reaching out to the real services.
        AppState::new(Config {
            hf_token: "test-token".to_string(),
            port: 0,
            work_dir: work_dir.to_path_buf(),
            text_api_url: "http://127.0.0.1:9/generate".to_string(),
            image_api_url: "http://127.0.0.1:9/diffuse".to_string(),
            tts_api_url: "http://127.0.0.1:9/tts".to_string(),
            image_count: 2,
        })
    }

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn trigger_returns_202_with_a_job_id() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()));

        let res = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/runs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::ACCEPTED);
        let json = body_json(res).await;
        assert_eq!(json["status"], "queued");
        assert!(json["job_id"].as_str().unwrap().parse::<Uuid>().is_ok());
    }

    #[tokio::test]
    async fn unknown_job_is_a_404() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()));

        let res = router
            .oneshot(
                Request::builder()
                    .uri(format!("/runs/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let json = body_json(res).await;
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn failed_run_reports_the_failing_stage() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let job_id = state.spawn_run();

        // Unreachable endpoints make the voiceover stage fail quickly.
        let status = loop {
            match state.status(&job_id) {
                Some(JobStatus::Failed { stage, message }) => break (stage, message),
                Some(_) => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
                None => panic!("job vanished from registry"),
            }
        };

        assert_eq!(status.0, "voiceover");
        assert!(!status.1.is_empty());
    }

    #[tokio::test]
    async fn workspace_setup_failure_reports_the_setup_stage() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the work dir should be makes RunPaths::create fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let state = test_state(&blocker);
        let job_id = state.spawn_run();

        let stage = loop {
            match state.status(&job_id) {
                Some(JobStatus::Failed { stage, .. }) => break stage,
                Some(_) => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
                None => panic!("job vanished from registry"),
            }
        };
        assert_eq!(stage, "setup");
    }

    #[test]
    fn completed_status_carries_script_and_video_path() {
        let view = JobView {
            job_id: Uuid::new_v4(),
            status: JobStatus::Completed {
                video_path: "/tmp/motivclip/runs/x/final.mp4".to_string(),
                script: "Heute ist dein Tag!".to_string(),
            },
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["video_path"], "/tmp/motivclip/runs/x/final.mp4");
        assert_eq!(json["script"], "Heute ist dein Tag!");
    }

    #[tokio::test]
    async fn health_endpoint_answers() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()));

        let res = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
