//! Wire shapes exchanged with the content-analysis service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightSpec {
    pub title: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub confidence: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailSpec {
    pub timestamp: f64,
    pub confidence: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSpec {
    pub platform: String,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub highlights: Vec<HighlightSpec>,
    #[serde(default)]
    pub thumbnails: Vec<ThumbnailSpec>,
    #[serde(default)]
    pub captions: Vec<CaptionSpec>,
    /// False for placeholder results that carry metadata only.
    #[serde(default)]
    pub media_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub video_location: String,
    pub highlights: Vec<HighlightSpec>,
    pub thumbnails: Vec<ThumbnailSpec>,
    pub out_dir: PathBuf,
}

/// Files produced by the renderer, index-aligned with the request's highlights and
/// thumbnails. Shorter lists mean the trailing items were not rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMedia {
    #[serde(default)]
    pub highlights: Vec<PathBuf>,
    #[serde(default)]
    pub thumbnails: Vec<PathBuf>,
}
