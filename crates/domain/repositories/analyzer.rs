use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::analysis::{AnalysisResult, RenderRequest, RenderedMedia};

#[async_trait]
#[automock]
pub trait VideoAnalyzer {
    async fn analyze(&self, video_location: String) -> Result<AnalysisResult>;

    async fn render(&self, request: RenderRequest) -> Result<RenderedMedia>;
}
