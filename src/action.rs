use std::collections::HashMap;

use thiserror::Error;
use url::form_urlencoded;

use crate::follow::ChannelFollowEntry;
use crate::source::invidious::SpecialList;

#[derive(Error, Debug, PartialEq)]
pub enum ActionError {
    #[error("Unknown action {0:?}")]
    UnknownAction(String),

    #[error("Action {action:?} requires parameter {param:?}")]
    MissingParameter {
        action: &'static str,
        param: &'static str,
    },
}

/// One navigation step requested by the host, parsed from the query string
/// the plugin was invoked with.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    MainMenu,
    Search,
    SpecialList(SpecialList),
    ShowChannel { channel_id: String },
    PlayVideo { video_id: String },
    Follow(ChannelFollowEntry),
    Unfollow { channel_id: String },
    ShowFollowing,
}

/// Decoded query string, first value per key. Blank values are dropped.
struct Params {
    values: HashMap<String, String>,
}

impl Params {
    fn parse(query: &str) -> Params {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut values = HashMap::new();
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            if v.is_empty() {
                continue;
            }
            values.entry(k.into_owned()).or_insert_with(|| v.into_owned());
        }
        Params { values }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    fn require(&self, action: &'static str, param: &'static str) -> Result<String, ActionError> {
        self.get(param)
            .map(|s| s.to_string())
            .ok_or(ActionError::MissingParameter { action, param })
    }
}

impl Action {
    /// Parse a `?`-prefixed (or bare) query string such as
    /// `?action=show_channel&channel_id=UC...`
    pub fn from_query(query: &str) -> Result<Action, ActionError> {
        let params = Params::parse(query);

        let name = match params.get("action") {
            None => return Ok(Action::MainMenu),
            Some(name) => name,
        };

        let action = match name {
            "search" => Action::Search,
            "show_channel" => Action::ShowChannel {
                channel_id: params.require("show_channel", "channel_id")?,
            },
            "play_video" => Action::PlayVideo {
                video_id: params.require("play_video", "video_id")?,
            },
            "follow" => Action::Follow(ChannelFollowEntry {
                channel_id: params.require("follow", "channel_id")?,
                name: params.require("follow", "name")?,
                thumbnail_url: params.require("follow", "thumbnail_url")?,
            }),
            "unfollow" => Action::Unfollow {
                channel_id: params.require("unfollow", "channel_id")?,
            },
            "show_following" => Action::ShowFollowing,
            other => match SpecialList::from_str(other) {
                Some(list) => Action::SpecialList(list),
                None => return Err(ActionError::UnknownAction(other.to_string())),
            },
        };
        Ok(action)
    }

    /// Name used for the `action` parameter, `None` for the main menu
    pub fn name(&self) -> Option<&str> {
        match self {
            Action::MainMenu => None,
            Action::Search => Some("search"),
            Action::SpecialList(list) => Some(list.as_str()),
            Action::ShowChannel { .. } => Some("show_channel"),
            Action::PlayVideo { .. } => Some("play_video"),
            Action::Follow(_) => Some("follow"),
            Action::Unfollow { .. } => Some("unfollow"),
            Action::ShowFollowing => Some("show_following"),
        }
    }

    /// Callback URL that invokes the plugin with this action
    pub fn to_url(&self, plugin_url: &str) -> String {
        let mut q = form_urlencoded::Serializer::new(String::new());
        if let Some(name) = self.name() {
            q.append_pair("action", name);
        }
        match self {
            Action::ShowChannel { channel_id } | Action::Unfollow { channel_id } => {
                q.append_pair("channel_id", channel_id);
            }
            Action::PlayVideo { video_id } => {
                q.append_pair("video_id", video_id);
            }
            Action::Follow(entry) => {
                q.append_pair("channel_id", &entry.channel_id);
                q.append_pair("name", &entry.name);
                q.append_pair("thumbnail_url", &entry.thumbnail_url);
            }
            Action::MainMenu | Action::Search | Action::SpecialList(_) | Action::ShowFollowing => {}
        }
        format!("{}?{}", plugin_url, q.finish())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PLUGIN: &str = "plugin://plugin.video.invidious/";

    #[test]
    fn test_main_menu() {
        assert_eq!(Action::from_query(""), Ok(Action::MainMenu));
        assert_eq!(Action::from_query("?"), Ok(Action::MainMenu));
        assert_eq!(Action::from_query("?action="), Ok(Action::MainMenu));
    }

    #[test]
    fn test_simple_actions() {
        assert_eq!(Action::from_query("?action=search"), Ok(Action::Search));
        assert_eq!(Action::from_query("action=show_following"), Ok(Action::ShowFollowing));
        assert_eq!(
            Action::from_query("?action=trending"),
            Ok(Action::SpecialList(SpecialList::Trending))
        );
    }

    #[test]
    fn test_first_value_wins() {
        assert_eq!(
            Action::from_query("?action=play_video&video_id=first&video_id=second"),
            Ok(Action::PlayVideo {
                video_id: "first".into()
            })
        );
    }

    #[test]
    fn test_follow_decodes_params() {
        let a = Action::from_query(
            "?action=follow&channel_id=UC1&name=Cats+%26+Dogs&thumbnail_url=https%3A%2F%2Fimg%2Fa.jpg",
        )
        .unwrap();
        assert_eq!(
            a,
            Action::Follow(ChannelFollowEntry {
                channel_id: "UC1".into(),
                name: "Cats & Dogs".into(),
                thumbnail_url: "https://img/a.jpg".into(),
            })
        );
    }

    #[test]
    fn test_missing_parameter() {
        assert_eq!(
            Action::from_query("?action=show_channel"),
            Err(ActionError::MissingParameter {
                action: "show_channel",
                param: "channel_id"
            })
        );
        assert_eq!(
            Action::from_query("?action=play_video&video_id="),
            Err(ActionError::MissingParameter {
                action: "play_video",
                param: "video_id"
            })
        );
        assert_eq!(
            Action::from_query("?action=follow&channel_id=UC1&name=x"),
            Err(ActionError::MissingParameter {
                action: "follow",
                param: "thumbnail_url"
            })
        );
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            Action::from_query("?action=subscriptions"),
            Err(ActionError::UnknownAction("subscriptions".into()))
        );
    }

    #[test]
    fn test_to_url() {
        assert_eq!(Action::MainMenu.to_url(PLUGIN), "plugin://plugin.video.invidious/?");
        assert_eq!(
            Action::ShowChannel {
                channel_id: "UC1".into()
            }
            .to_url(PLUGIN),
            "plugin://plugin.video.invidious/?action=show_channel&channel_id=UC1"
        );

        let follow = Action::Follow(ChannelFollowEntry {
            channel_id: "UC1".into(),
            name: "Cats & Dogs".into(),
            thumbnail_url: "https://img/a.jpg?x=1".into(),
        });
        let url = follow.to_url(PLUGIN);
        let query = &url[PLUGIN.len()..];
        assert_eq!(Action::from_query(query), Ok(follow));
    }
}
