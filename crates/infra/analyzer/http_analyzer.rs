use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::domain::{
    repositories::analyzer::VideoAnalyzer,
    value_objects::analysis::{AnalysisResult, RenderRequest, RenderedMedia},
};

#[derive(Debug, Clone)]
pub struct HttpAnalyzerConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

/// Client for the content-analysis service (`POST /analyze`, `POST /render`).
pub struct HttpVideoAnalyzer {
    http_client: Client,
    base_url: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    video_location: &'a str,
}

impl HttpVideoAnalyzer {
    pub fn new(config: HttpAnalyzerConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build analyzer http client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid analyzer endpoint: {path}"))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.http_client.post(url.clone()).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "analyzer: request rejected");
            bail!("analyzer returned {status}: {body}");
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl VideoAnalyzer for HttpVideoAnalyzer {
    async fn analyze(&self, video_location: String) -> Result<AnalysisResult> {
        info!(video_location, "analyzer: requesting analysis");
        let result: AnalysisResult = self
            .post_json(
                "analyze",
                &AnalyzeRequest {
                    video_location: &video_location,
                },
            )
            .await?;
        info!(
            highlights = result.highlights.len(),
            thumbnails = result.thumbnails.len(),
            captions = result.captions.len(),
            media_available = result.media_available,
            "analyzer: analysis received"
        );
        Ok(result)
    }

    async fn render(&self, request: RenderRequest) -> Result<RenderedMedia> {
        info!(
            video_location = %request.video_location,
            out_dir = %request.out_dir.display(),
            "analyzer: requesting render"
        );
        self.post_json("render", &request).await
    }
}
