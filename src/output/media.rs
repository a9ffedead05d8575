//! Media download sink
//!
//! Each accepted note gets its own directory under the media root named
//! `<title>_<note id>`, holding `info.json` (the raw note payload) plus every
//! image as `image_<n>.jpg` and the video as `video.mp4`.

use crate::api::{Item, MediaKind};
use crate::output::traits::{ItemSink, SinkConfig, SinkError, SinkResult};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};

const MAX_COMPONENT_CHARS: usize = 50;

/// Makes `raw` safe to use as a single path component
///
/// Path separators, reserved characters and control characters become `_`;
/// the result is trimmed and capped at 50 characters.
pub fn sanitize_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed: String = replaced
        .trim()
        .trim_matches('.')
        .chars()
        .take(MAX_COMPONENT_CHARS)
        .collect();

    if trimmed.trim().is_empty() {
        "untitled".to_string()
    } else {
        trimmed.trim().to_string()
    }
}

/// Sink that downloads each note's media files
pub struct MediaSink {
    client: Client,
    root: PathBuf,
}

impl MediaSink {
    pub fn new(client: Client, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }

    /// Directory that holds the files of `item`
    pub fn note_dir(&self, item: &Item) -> PathBuf {
        self.root
            .join(format!("{}_{}", sanitize_component(&item.title), item.id))
    }

    async fn download(&self, url: &str, dest: &Path) -> SinkResult<()> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemSink for MediaSink {
    fn name(&self) -> &'static str {
        "media"
    }

    async fn write(&self, item: &Item, config: &SinkConfig) -> SinkResult<()> {
        if !config.media_filter.accepts(item.kind) {
            tracing::debug!(
                "Skipping media for {} note {}",
                item.kind.as_str(),
                item.id
            );
            return Ok(());
        }

        let dir = self.note_dir(item);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("info.json"), serde_json::to_vec_pretty(&item.raw)?).await?;

        // Keep going after a failed file so one bad URL doesn't cost the rest.
        let mut first_error = None;
        let mut image_index = 0;
        for media in &item.media {
            let file_name = match media.kind {
                MediaKind::Image => {
                    image_index += 1;
                    format!("image_{}.jpg", image_index)
                }
                MediaKind::Video => "video.mp4".to_string(),
            };

            if let Err(e) = self.download(&media.url, &dir.join(&file_name)).await {
                tracing::warn!("Failed to download {} for note {}: {}", file_name, item.id, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
