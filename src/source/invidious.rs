use std::time::Duration;

use log::{debug, trace};
use serde_json::Value;
use url::form_urlencoded;

use crate::source::base::{ApiError, SearchResult, VideoListItem};
use crate::source::normalize;

/// Special lists are fixed, parameterless feeds provided by the API
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecialList {
    Trending,
    Popular,
}

impl SpecialList {
    pub const ALL: [SpecialList; 2] = [SpecialList::Trending, SpecialList::Popular];

    pub fn as_str(&self) -> &str {
        match self {
            SpecialList::Trending => "trending",
            SpecialList::Popular => "popular",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "trending" => Some(SpecialList::Trending),
            "popular" => Some(SpecialList::Popular),
            _ => None,
        }
    }

    /// Menu label, e.g "Trending"
    pub fn label(&self) -> &str {
        match self {
            SpecialList::Trending => "Trending",
            SpecialList::Popular => "Popular",
        }
    }
}

/// Join path segments below `/api/v1/`, collapsing repeated slashes
/// so `["videos/", "abc123"]` becomes `videos/abc123`
pub fn request_path(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|s| s.split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("/")
}

/// Percent-encode an ID taken from the query string so it stays a single
/// path segment (`/`, `?`, `#` and dot segments are escaped)
pub fn encode_segment(id: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    match encoded.as_str() {
        "." => "%2E".into(),
        ".." => "%2E%2E".into(),
        _ => encoded,
    }
}

fn map_transport_error(e: attohttpc::Error) -> ApiError {
    let timed_out = match e.kind() {
        attohttpc::ErrorKind::Io(io) => matches!(
            io.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        ),
        _ => false,
    };
    if timed_out {
        ApiError::Timeout
    } else {
        ApiError::Transport(e)
    }
}

/// Client for the `/api/v1/` endpoints of a single Invidious instance
#[derive(Debug, Clone)]
pub struct InvidiousClient {
    base_url: String,
    timeout: Duration,
}

impl InvidiousClient {
    pub fn new(instance_url: &str, timeout: Duration) -> InvidiousClient {
        InvidiousClient {
            base_url: instance_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_url(&self, segments: &[&str]) -> String {
        format!(
            "{prefix}/api/v1/{path}",
            prefix = self.base_url,
            path = request_path(segments)
        )
    }

    /// GET an API endpoint and parse the body as JSON
    pub fn make_request(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.request_url(segments);
        debug!("Retrieving URL {} with params {:?}", &url, params);

        let mut req = attohttpc::get(&url);
        for (key, value) in params {
            req = req.param(key, value);
        }
        let resp = req
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .read_timeout(self.timeout)
            .send()
            .map_err(map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            debug!("Request to {} failed with status {}", &url, status);
            return Err(ApiError::HttpStatus {
                status_code: status.as_u16(),
            });
        }

        let text = resp.text().map_err(map_transport_error)?;
        trace!("Raw response: {}", &text);
        serde_json::from_str(&text).map_err(|e| {
            ApiError::MalformedResponse(format!("Failed to parse response from {}: {}", &url, e))
        })
    }

    pub fn search(&self, terms: &[&str]) -> Result<Vec<SearchResult>, ApiError> {
        let q = terms.join(" ");
        let data = self.make_request(&["search"], &[("q", q.as_str()), ("sort_by", "upload_date")])?;
        normalize::normalize_search_results(data)
    }

    /// Raw video details, used to resolve a playable stream
    pub fn fetch_video_information(&self, video_id: &str) -> Result<Value, ApiError> {
        self.make_request(&["videos/", encode_segment(video_id).as_str()], &[])
    }

    pub fn fetch_channel_list(&self, channel_id: &str) -> Result<Vec<VideoListItem>, ApiError> {
        let data = self.make_request(&["channels/videos/", encode_segment(channel_id).as_str()], &[])?;
        normalize::normalize_video_list(data)
    }

    pub fn fetch_special_list(&self, name: &str) -> Result<Vec<VideoListItem>, ApiError> {
        let data = self.make_request(&[name], &[])?;
        normalize::normalize_video_list(data)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use mockito::Matcher;

    const SEARCH_BODY: &str = r#"[
        {
            "type": "video",
            "title": "Cat compilation",
            "videoId": "abc123",
            "author": "Cats Inc",
            "authorId": "UCcats",
            "videoThumbnails": [
                {"quality": "medium", "url": "a", "width": 320, "height": 180},
                {"quality": "high", "url": "b", "width": 480, "height": 360}
            ],
            "description": "Many cats",
            "viewCount": 1000,
            "published": 1600000000,
            "lengthSeconds": 60
        }
    ]"#;

    fn client(server: &mockito::ServerGuard) -> InvidiousClient {
        InvidiousClient::new(&server.url(), Duration::from_secs(5))
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path(&["videos/", "abc123"]), "videos/abc123");
        assert_eq!(request_path(&["channels/videos/", "UC1"]), "channels/videos/UC1");
        assert_eq!(request_path(&["/trending"]), "trending");
        assert_eq!(request_path(&["a//b", "/c/"]), "a/b/c");
    }

    #[test]
    fn test_ids_stay_in_their_segment() {
        let c = InvidiousClient::new("https://example.invidious.test", Duration::from_secs(5));
        assert_eq!(
            c.request_url(&["videos/", encode_segment("abc?x=1").as_str()]),
            "https://example.invidious.test/api/v1/videos/abc%3Fx%3D1"
        );
        assert_eq!(
            c.request_url(&["videos/", encode_segment("../trending").as_str()]),
            "https://example.invidious.test/api/v1/videos/..%2Ftrending"
        );
        assert_eq!(encode_segment(".."), "%2E%2E");
        assert_eq!(encode_segment("a b#c"), "a%20b%23c");
        assert_eq!(encode_segment("dQw4w9WgXcQ-_"), "dQw4w9WgXcQ-_");
    }

    #[test]
    fn test_encoded_id_reaches_endpoint() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/api/v1/videos/abc%3Fx%3D1")
            .with_body(r#"{"videoId": "abc?x=1"}"#)
            .create();

        let info = client(&server).fetch_video_information("abc?x=1").unwrap();
        m.assert();
        assert_eq!(info["videoId"], "abc?x=1");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let c = InvidiousClient::new("https://example.invidious.test/", Duration::from_secs(5));
        assert_eq!(c.base_url(), "https://example.invidious.test");
        assert_eq!(
            c.request_url(&["videos/", "abc123"]),
            "https://example.invidious.test/api/v1/videos/abc123"
        );
    }

    #[test]
    fn test_search() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "cats".into()),
                Matcher::UrlEncoded("sort_by".into(), "upload_date".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SEARCH_BODY)
            .create();

        let results = client(&server).search(&["cats"]).unwrap();
        m.assert();

        assert_eq!(results.len(), 1);
        match &results[0] {
            SearchResult::Video(v) => {
                assert_eq!(v.video_id, "abc123");
                assert_eq!(v.thumbnail_url, "b");
                assert_eq!(v.view_count, 1000);
            }
            other => panic!("expected video, got {:?}", other),
        }
    }

    #[test]
    fn test_search_joins_terms() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "funny cats".into()),
                Matcher::UrlEncoded("sort_by".into(), "upload_date".into()),
            ]))
            .with_body("[]")
            .create();

        let results = client(&server).search(&["funny", "cats"]).unwrap();
        m.assert();
        assert!(results.is_empty());
    }

    #[test]
    fn test_not_found_everywhere() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", Matcher::Any)
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error": "not found"}"#)
            .create();

        let c = client(&server);
        fn is_404<T: std::fmt::Debug>(r: Result<T, ApiError>) -> bool {
            matches!(r, Err(ApiError::HttpStatus { status_code: 404 }))
        }
        assert!(is_404(c.search(&["cats"])));
        assert!(is_404(c.fetch_video_information("abc123")));
        assert!(is_404(c.fetch_channel_list("UC1")));
        assert!(is_404(c.fetch_special_list("trending")));
    }

    #[test]
    fn test_video_information() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/api/v1/videos/abc123")
            .with_body(r#"{"videoId": "abc123", "formatStreams": [{"url": "https://x/stream"}]}"#)
            .create();

        let info = client(&server).fetch_video_information("abc123").unwrap();
        m.assert();
        assert_eq!(info["videoId"], "abc123");
    }

    #[test]
    fn test_channel_list_paged() {
        let mut server = mockito::Server::new();
        let body = format!(
            r#"{{"videos": {}, "continuation": "abc"}}"#,
            SEARCH_BODY
        );
        let m = server
            .mock("GET", "/api/v1/channels/videos/UCcats")
            .with_body(body)
            .create();

        let videos = client(&server).fetch_channel_list("UCcats").unwrap();
        m.assert();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].title, "Cat compilation");
    }

    #[test]
    fn test_special_list() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/api/v1/popular")
            .with_body(SEARCH_BODY)
            .create();

        let videos = client(&server)
            .fetch_special_list(SpecialList::Popular.as_str())
            .unwrap();
        m.assert();
        assert_eq!(videos[0].author, "Cats Inc");
    }

    #[test]
    fn test_garbage_body() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/api/v1/trending")
            .with_body("garbagenonsense")
            .create();

        assert!(matches!(
            client(&server).fetch_special_list("trending"),
            Err(ApiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_timeout() {
        // Connections are queued by the OS but never answered
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let c = InvidiousClient::new(&url, Duration::from_millis(200));

        assert!(matches!(c.fetch_special_list("trending"), Err(ApiError::Timeout)));
        drop(listener);
    }

    #[test]
    fn test_special_list_names() {
        for l in SpecialList::ALL.iter() {
            assert_eq!(SpecialList::from_str(l.as_str()), Some(*l));
        }
        assert_eq!(SpecialList::from_str("subscriptions"), None);
    }
}
