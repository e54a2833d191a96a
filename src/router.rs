use anyhow::{Context, Result};
use chrono::TimeZone;
use log::{debug, info, warn};

use crate::action::Action;
use crate::follow::{ChannelFollowEntry, FollowStore};
use crate::host::{Host, ListItem, NotificationLevel, VideoInfoLabels};
use crate::source::base::{ApiError, ChannelListItem, SearchResult, VideoListItem};
use crate::source::invidious::{InvidiousClient, SpecialList};
use crate::source::normalize;

/// `YYYY-MM-DD` for a unix timestamp, empty if out of range
fn format_date(published: i64) -> String {
    chrono::Utc
        .timestamp_opt(published, 0)
        .single()
        .map(|d| d.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Handles a single plugin invocation
pub struct Router<'a, H: Host> {
    plugin_url: String,
    client: &'a InvidiousClient,
    store: &'a FollowStore,
    host: &'a mut H,
}

impl<'a, H: Host> Router<'a, H> {
    pub fn new(
        plugin_url: &str,
        client: &'a InvidiousClient,
        store: &'a FollowStore,
        host: &'a mut H,
    ) -> Self {
        Router {
            plugin_url: plugin_url.into(),
            client,
            store,
            host,
        }
    }

    /// Run an action. HTTP status and timeout errors from the API become a
    /// notification; every other error is returned.
    pub fn run(&mut self, action: Action) -> Result<()> {
        debug!("Dispatching {:?}", &action);
        let err = match self.dispatch(action) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        let notification = match err.downcast_ref::<ApiError>() {
            Some(ApiError::HttpStatus { status_code }) => {
                warn!("Invidious returned HTTP status {}", status_code);
                Some((
                    "Request failed",
                    format!("HTTP request returned bad status code: {}", status_code),
                ))
            }
            Some(ApiError::Timeout) => {
                warn!("Request to Invidious timed out");
                Some((
                    "Request timed out",
                    "The Invidious instance did not respond in time.".to_string(),
                ))
            }
            _ => None,
        };

        match notification {
            Some((heading, message)) => self.host.notify(heading, &message, NotificationLevel::Error),
            None => Err(err),
        }
    }

    fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::MainMenu => self.display_main_menu(),
            Action::Search => self.search(),
            Action::SpecialList(list) => self.display_special_list(list),
            Action::ShowChannel { channel_id } => self.display_channel(&channel_id),
            Action::PlayVideo { video_id } => self.play_video(&video_id),
            Action::Follow(entry) => self.follow(&entry),
            Action::Unfollow { channel_id } => self.unfollow(&channel_id),
            Action::ShowFollowing => self.display_following(),
        }
    }

    fn url(&self, action: &Action) -> String {
        action.to_url(&self.plugin_url)
    }

    fn add_folder(&mut self, label: &str, action: &Action) -> Result<()> {
        let url = self.url(action);
        self.host.add_directory_item(&url, &ListItem::new(label), true)
    }

    fn display_main_menu(&mut self) -> Result<()> {
        self.add_folder("Search", &Action::Search)?;
        for list in SpecialList::ALL.iter() {
            self.add_folder(list.label(), &Action::SpecialList(*list))?;
        }
        self.add_folder("Following", &Action::ShowFollowing)?;
        self.host.end_of_directory()
    }

    fn add_video(&mut self, video: &VideoListItem) -> Result<()> {
        let date = format_date(video.published);
        let mut item = ListItem::new(&video.title);
        item.thumbnail = Some(video.thumbnail_url.clone());
        item.info = Some(VideoInfoLabels {
            plot: video.description.clone(),
            credits: video.author.clone(),
            date,
        });
        // Without this the player calls back with an invalid handle
        item.playable = true;

        let url = self.url(&Action::PlayVideo {
            video_id: video.video_id.clone(),
        });
        self.host.add_directory_item(&url, &item, false)
    }

    fn add_channel(&mut self, channel: &ChannelListItem) -> Result<()> {
        let mut item = ListItem::new(&channel.name);
        item.thumbnail = Some(channel.thumbnail_url.clone());

        if self.store.is_following(&channel.channel_id)? {
            let unfollow = self.url(&Action::Unfollow {
                channel_id: channel.channel_id.clone(),
            });
            item.context_menu.push(("Unfollow".into(), unfollow));
        } else {
            let follow = self.url(&Action::Follow(ChannelFollowEntry {
                channel_id: channel.channel_id.clone(),
                name: channel.name.clone(),
                thumbnail_url: channel.thumbnail_url.clone(),
            }));
            item.context_menu.push(("Follow".into(), follow));
        }

        let url = self.url(&Action::ShowChannel {
            channel_id: channel.channel_id.clone(),
        });
        self.host.add_directory_item(&url, &item, true)
    }

    fn display_videos(&mut self, videos: &[VideoListItem]) -> Result<()> {
        for v in videos {
            self.add_video(v)?;
        }
        self.host.end_of_directory()
    }

    fn search(&mut self) -> Result<()> {
        let input = self.host.input("Search videos")?;
        let input = match input {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                debug!("Search cancelled");
                return self.host.end_of_directory();
            }
        };

        let terms: Vec<&str> = input.split_whitespace().collect();
        let results = self.client.search(&terms)?;
        info!("Search {:?} returned {} results", &input, results.len());

        for r in &results {
            match r {
                SearchResult::Video(v) => self.add_video(v)?,
                SearchResult::Channel(c) => self.add_channel(c)?,
            }
        }
        self.host.end_of_directory()
    }

    fn display_special_list(&mut self, list: SpecialList) -> Result<()> {
        let videos = self.client.fetch_special_list(list.as_str())?;
        self.display_videos(&videos)
    }

    fn display_channel(&mut self, channel_id: &str) -> Result<()> {
        let videos = self.client.fetch_channel_list(channel_id)?;
        self.display_videos(&videos)
    }

    fn play_video(&mut self, video_id: &str) -> Result<()> {
        let info = self.client.fetch_video_information(video_id)?;
        let adaptive = normalize::has_dash_manifest(&info) && self.host.supports_adaptive();
        let stream = normalize::resolve_stream(&info, adaptive)
            .with_context(|| format!("Unable to play video {}", video_id))?;
        debug!("Resolved {} to {:?}", video_id, &stream);
        self.host.set_resolved_url(&stream)
    }

    fn follow(&mut self, entry: &ChannelFollowEntry) -> Result<()> {
        self.store.follow(entry)?;
        self.host.notify(
            "Following",
            &format!("You are now following {}.", entry.name),
            NotificationLevel::Info,
        )
    }

    fn unfollow(&mut self, channel_id: &str) -> Result<()> {
        if self.store.unfollow(channel_id)? {
            self.host.notify(
                "Following",
                "Channel removed from your follow list.",
                NotificationLevel::Info,
            )
        } else {
            self.host.notify(
                "Unfollow failed",
                "You are not following this channel.",
                NotificationLevel::Error,
            )
        }
    }

    fn display_following(&mut self) -> Result<()> {
        for channel in self.store.list()? {
            let mut item = ListItem::new(&channel.name);
            item.thumbnail = Some(channel.thumbnail_url.clone());
            let unfollow = self.url(&Action::Unfollow {
                channel_id: channel.channel_id.clone(),
            });
            item.context_menu.push(("Unfollow".into(), unfollow));

            let url = self.url(&Action::ShowChannel {
                channel_id: channel.channel_id,
            });
            self.host.add_directory_item(&url, &item, true)?;
        }
        self.host.end_of_directory()
    }
}
