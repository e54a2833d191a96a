use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

/// A channel the user follows
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFollowEntry {
    pub channel_id: String,
    pub name: String,
    pub thumbnail_url: String,
}

/// On-disk value, keyed by channel ID in the file
#[derive(Serialize, Deserialize, Debug, Clone)]
struct StoredChannel {
    name: String,
    thumbnail: String,
}

type FollowMap = BTreeMap<String, StoredChannel>;

/// The follow list, stored as a flat JSON object in the data directory.
///
/// Every operation opens the file, reads or writes it, and closes it again.
/// There is no locking: concurrent writers race and the last one wins.
#[derive(Debug, Clone)]
pub struct FollowStore {
    path: PathBuf,
}

impl FollowStore {
    pub fn new(path: impl Into<PathBuf>) -> FollowStore {
        FollowStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means nothing is followed yet
    fn load(&self) -> Result<FollowMap> {
        if !self.path.exists() {
            debug!("No follow list at {:?}", &self.path);
            return Ok(FollowMap::new());
        }
        let f = std::fs::File::open(&self.path)
            .with_context(|| format!("Failed to open follow list {:?}", &self.path))?;
        let map: FollowMap = serde_json::from_reader(std::io::BufReader::new(f))
            .with_context(|| format!("Failed to parse follow list {:?}", &self.path))?;
        Ok(map)
    }

    fn save(&self, map: &FollowMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to make data folder")?;
        }
        let f = std::fs::File::create(&self.path)
            .with_context(|| format!("Failed to write follow list {:?}", &self.path))?;
        serde_json::to_writer_pretty(f, map)?;
        Ok(())
    }

    /// Add (or refresh) a channel
    pub fn follow(&self, entry: &ChannelFollowEntry) -> Result<()> {
        let mut map = self.load()?;
        map.insert(
            entry.channel_id.clone(),
            StoredChannel {
                name: entry.name.clone(),
                thumbnail: entry.thumbnail_url.clone(),
            },
        );
        self.save(&map)?;
        info!("Following channel {:?} ({})", &entry.channel_id, &entry.name);
        Ok(())
    }

    /// Remove a channel. Returns false, leaving the file untouched, if it
    /// was not followed.
    pub fn unfollow(&self, channel_id: &str) -> Result<bool> {
        let mut map = self.load()?;
        if map.remove(channel_id).is_none() {
            debug!("Not following {:?}, nothing to remove", channel_id);
            return Ok(false);
        }
        self.save(&map)?;
        info!("Unfollowed channel {:?}", channel_id);
        Ok(true)
    }

    pub fn is_following(&self, channel_id: &str) -> Result<bool> {
        Ok(self.load()?.contains_key(channel_id))
    }

    /// All followed channels, ordered by channel ID
    pub fn list(&self) -> Result<Vec<ChannelFollowEntry>> {
        Ok(self
            .load()?
            .into_iter()
            .map(|(channel_id, c)| ChannelFollowEntry {
                channel_id,
                name: c.name,
                thumbnail_url: c.thumbnail,
            })
            .collect())
    }
}
