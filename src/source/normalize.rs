//! Conversion of raw Invidious JSON into the records used by the router.

use log::{debug, trace};
use serde_json::Value;

use crate::source::base::{
    ApiError, ChannelListItem, ManifestType, ResolvedStream, SearchResult, VideoListItem,
};

/// Shown when a video carries no description
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available.";

/// Thumbnail quality tag preferred over every other entry
const PREFERRED_QUALITY: &str = "high";

/*
Video objects as returned by search, trending, popular and channel listings:

{
  type: "video",
  title: String,
  videoId: String,
  author: String,
  authorId: String,
  videoThumbnails: [{ quality: String, url: String, width: Int32, height: Int32 }],
  description: String,
  viewCount: Int64,
  published: Int64,
  lengthSeconds: Int32
}

Channel objects in search results:

{
  type: "channel",
  author: String,
  authorId: String,
  authorThumbnails: [{ url: String, width: Int32, height: Int32 }]
}
*/
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct RawThumbnail {
    quality: Option<String>,
    url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct RawVideo {
    video_id: String,
    title: String,
    author: String,
    description: Option<String>,
    #[serde(default)]
    video_thumbnails: Vec<RawThumbnail>,
    view_count: Option<i64>,
    published: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct RawChannel {
    author_id: String,
    author: String,
    #[serde(default)]
    author_thumbnails: Vec<RawThumbnail>,
}

/// Channel video listings come either as a bare array or, on newer
/// instances, as a page with a continuation token.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawVideoList {
    Bare(Vec<Value>),
    Page { videos: Vec<Value> },
}

fn malformed(msg: impl Into<String>) -> ApiError {
    ApiError::MalformedResponse(msg.into())
}

/// Return the "high" quality thumbnail, falling back to the last entry
fn choose_best_thumbnail(thumbs: &[RawThumbnail]) -> Result<&RawThumbnail, ApiError> {
    thumbs
        .iter()
        .find(|t| t.quality.as_deref() == Some(PREFERRED_QUALITY))
        .or_else(|| thumbs.last())
        .ok_or_else(|| malformed("empty thumbnail list"))
}

/// Channel avatars are often protocol-relative (`//yt3.ggpht.com/...`)
fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

pub fn normalize_video(raw: Value) -> Result<VideoListItem, ApiError> {
    let v: RawVideo = serde_json::from_value(raw)
        .map_err(|e| malformed(format!("invalid video object: {}", e)))?;
    let thumbnail = choose_best_thumbnail(&v.video_thumbnails)
        .map_err(|_| malformed(format!("video {} has no thumbnails", v.video_id)))?;

    Ok(VideoListItem {
        thumbnail_url: absolute_url(&thumbnail.url),
        description: v
            .description
            .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string()),
        view_count: v.view_count.unwrap_or(0),
        published: v.published.unwrap_or(0),
        video_id: v.video_id,
        title: v.title,
        author: v.author,
    })
}

pub fn normalize_channel(raw: Value) -> Result<ChannelListItem, ApiError> {
    let c: RawChannel = serde_json::from_value(raw)
        .map_err(|e| malformed(format!("invalid channel object: {}", e)))?;
    let thumbnail = choose_best_thumbnail(&c.author_thumbnails)
        .map_err(|_| malformed(format!("channel {} has no thumbnails", c.author_id)))?;

    Ok(ChannelListItem {
        thumbnail_url: absolute_url(&thumbnail.url),
        channel_id: c.author_id,
        name: c.author,
    })
}

/// Normalise a search response. Entries that are neither videos nor
/// channels (playlists, hashtags) are skipped.
pub fn normalize_search_results(raw: Value) -> Result<Vec<SearchResult>, ApiError> {
    let items = match raw {
        Value::Array(items) => items,
        other => return Err(malformed(format!("expected search result array, got {}", other))),
    };

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let kind = item
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("video")
            .to_string();
        match kind.as_str() {
            "video" => results.push(SearchResult::Video(normalize_video(item)?)),
            "channel" => results.push(SearchResult::Channel(normalize_channel(item)?)),
            other => debug!("Skipping search result of type {:?}", other),
        }
    }
    trace!("Normalised search results: {:?}", &results);
    Ok(results)
}

/// Normalise a list of videos (special lists and channel listings)
pub fn normalize_video_list(raw: Value) -> Result<Vec<VideoListItem>, ApiError> {
    let list: RawVideoList = serde_json::from_value(raw)
        .map_err(|e| malformed(format!("expected list of videos: {}", e)))?;
    let items = match list {
        RawVideoList::Bare(videos) => videos,
        RawVideoList::Page { videos } => videos,
    };
    items.into_iter().map(normalize_video).collect()
}

/// Whether the video information offers an MPEG-DASH manifest
pub fn has_dash_manifest(info: &Value) -> bool {
    info.get("dashUrl").and_then(|u| u.as_str()).is_some()
}

/// Pick the URL to play. The DASH manifest is used only when the host can
/// play it, otherwise the first progressive stream.
pub fn resolve_stream(info: &Value, adaptive_supported: bool) -> Result<ResolvedStream, ApiError> {
    if adaptive_supported {
        if let Some(url) = info.get("dashUrl").and_then(|u| u.as_str()) {
            return Ok(ResolvedStream {
                url: url.to_string(),
                manifest: Some(ManifestType::Mpd),
            });
        }
    }

    info.pointer("/formatStreams/0/url")
        .and_then(|u| u.as_str())
        .map(|url| ResolvedStream {
            url: url.to_string(),
            manifest: None,
        })
        .ok_or_else(|| malformed("video has no playable stream"))
}
