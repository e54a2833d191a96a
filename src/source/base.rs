use thiserror::Error;

/// Failures raised by the Invidious API client and the normaliser
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed with HTTP status {status_code}")]
    HttpStatus { status_code: u16 },

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("HTTP request failed")]
    Transport(#[source] attohttpc::Error),
}

/// Important info about a video
#[derive(Clone, PartialEq)]
pub struct VideoListItem {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub thumbnail_url: String,
    pub view_count: i64,
    /// Unix timestamp, seconds
    pub published: i64,
}

impl std::fmt::Debug for VideoListItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "VideoListItem{{video_id: {:?}, title: {:?}, author: {:?}, published: {:?}}}",
            self.video_id, self.title, self.author, self.published,
        )
    }
}

/// Channel as it appears in search results
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelListItem {
    pub channel_id: String,
    pub name: String,
    pub thumbnail_url: String,
}

/// Single entry from a search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Video(VideoListItem),
    Channel(ChannelListItem),
}

/// How the host should treat a resolved stream URL
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManifestType {
    Mpd,
}

impl ManifestType {
    pub fn as_str(&self) -> &str {
        match self {
            ManifestType::Mpd => "mpd",
        }
    }
}

/// Playable location of a video
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStream {
    pub url: String,
    /// `None` for a plain progressive stream
    pub manifest: Option<ManifestType>,
}
