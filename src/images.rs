use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{error, info};

use crate::config::Config;
use crate::run::RunPaths;
use crate::video::{FRAME_HEIGHT, FRAME_WIDTH};

fn image_prompt(script: &str) -> String {
    format!("A vibrant, motivational scene: {script}")
}

/// Generate `count` slide images from the script. Always returns exactly
/// `count` paths and never errors: a failure anywhere in the loop discards
/// any partial results and substitutes the run's placeholder for every slot,
/// so the composer sees a uniform set either way.
pub async fn generate_images(
    client: &Client,
    config: &Config,
    script: &str,
    count: usize,
    paths: &RunPaths,
) -> Vec<PathBuf> {
    match request_images(client, config, script, count, paths).await {
        Ok(images) => images,
        Err(e) => {
            error!("Image generation failed, falling back to placeholder: {e:#}");
            let fallback = paths.placeholder();
            if let Err(e) = write_placeholder(&fallback) {
                error!("Could not write placeholder image: {e:#}");
            }
            vec![fallback; count]
        }
    }
}

async fn request_images(
    client: &Client,
    config: &Config,
    script: &str,
    count: usize,
    paths: &RunPaths,
) -> anyhow::Result<Vec<PathBuf>> {
    let prompt = image_prompt(script);
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        info!("Requesting image {}/{}", i + 1, count);
        let res = client
            .post(&config.image_api_url)
            .bearer_auth(&config.hf_token)
            .json(&serde_json::json!({ "inputs": prompt }))
            .send()
            .await?
            .error_for_status()?;
        let bytes = res.bytes().await?;

        // Round-trip through the decoder: rejects the HTML/JSON error pages
        // the inference API sometimes serves with a 200.
        let img = image::load_from_memory(&bytes)?;
        let path = paths.image(i);
        img.save(&path)?;
        info!("Slide written to {}", path.display());
        out.push(path);
    }
    Ok(out)
}

/// Solid dark frame at the output resolution, so a degraded run still renders.
fn write_placeholder(path: &Path) -> anyhow::Result<()> {
    let img = image::RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, image::Rgb([16, 16, 24]));
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunId;
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer, work_dir: &std::path::Path) -> Config {
        Config {
            hf_token: "test-token".to_string(),
            port: 0,
            work_dir: work_dir.to_path_buf(),
            text_api_url: format!("{}/generate", server.uri()),
            image_api_url: format!("{}/diffuse", server.uri()),
            tts_api_url: format!("{}/tts", server.uri()),
            image_count: 2,
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 40]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn writes_one_file_per_requested_image() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server, dir.path());
        let paths = RunPaths::create(dir.path(), RunId::new()).unwrap();

        Mock::given(method("POST"))
            .and(path("/diffuse"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
            .expect(2)
            .mount(&server)
            .await;

        let client = Client::new();
        let images = generate_images(&client, &config, "Heute", 2, &paths).await;

        assert_eq!(images, vec![paths.image(0), paths.image(1)]);
        assert!(images.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn upstream_failure_yields_uniform_placeholder_set() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server, dir.path());
        let paths = RunPaths::create(dir.path(), RunId::new()).unwrap();

        Mock::given(method("POST"))
            .and(path("/diffuse"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = Client::new();
        let images = generate_images(&client, &config, "Heute", 2, &paths).await;

        assert_eq!(images, vec![paths.placeholder(), paths.placeholder()]);
        // The placeholder is materialized so a degraded run can still compose.
        assert!(paths.placeholder().exists());
    }

    #[tokio::test]
    async fn undecodable_body_yields_placeholder_set() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server, dir.path());
        let paths = RunPaths::create(dir.path(), RunId::new()).unwrap();

        Mock::given(method("POST"))
            .and(path("/diffuse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "model loading"})),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let images = generate_images(&client, &config, "Heute", 3, &paths).await;
        assert_eq!(images, vec![paths.placeholder(); 3]);
    }

    #[tokio::test]
    async fn zero_images_requested_is_an_empty_set() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server, dir.path());
        let paths = RunPaths::create(dir.path(), RunId::new()).unwrap();

        let client = Client::new();
        let images = generate_images(&client, &config, "Heute", 0, &paths).await;
        assert!(images.is_empty());
    }
}
