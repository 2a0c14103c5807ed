use std::path::{Component, Path};

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use url::Url;

pub const MAX_SOURCE_URL_LEN: usize = 2048;
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterVideoModel {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Where the analyzer reads a video from: a remote URL or a path under the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    Remote(String),
    Stored(String),
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn normalize_video_source(model: &RegisterVideoModel) -> Result<VideoSource> {
    match (non_blank(&model.source_url), non_blank(&model.file_path)) {
        (Some(url), None) => normalize_source_url(url).map(VideoSource::Remote),
        (None, Some(path)) => normalize_file_path(path).map(VideoSource::Stored),
        (Some(_), Some(_)) => bail!("Invalid video: give either source_url or file_path, not both"),
        (None, None) => bail!("Invalid video: source_url or file_path is required"),
    }
}

pub fn normalize_title(title: &Option<String>) -> Result<Option<String>> {
    match non_blank(title) {
        Some(title) if title.chars().count() > MAX_TITLE_LEN => bail!("Invalid title: too long"),
        Some(title) => Ok(Some(title.to_string())),
        None => Ok(None),
    }
}

fn normalize_source_url(raw: &str) -> Result<String> {
    if raw.len() > MAX_SOURCE_URL_LEN {
        bail!("Invalid URL: too long");
    }

    let url = Url::parse(raw).map_err(|err| anyhow!("Invalid URL: {}", err))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid URL: only http and https are allowed");
    }
    if !url.username().is_empty() || url.password().is_some() {
        bail!("Invalid URL: userinfo is not allowed");
    }
    if url.host_str().is_none() {
        bail!("Invalid URL: missing host");
    }

    Ok(url.to_string())
}

fn normalize_file_path(raw: &str) -> Result<String> {
    let path = Path::new(raw);
    let escapes_root = path
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));

    if escapes_root {
        bail!("Invalid file path: must be relative to the media root");
    }

    Ok(raw.replace('\\', "/"))
}
