use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use directories::ProjectDirs;

/// Used when neither `--instance` nor `INVIDIOUS_INSTANCE_URL` is given
pub const DEFAULT_INSTANCE_URL: &str = "https://yewtu.be";

const FOLLOWING_FILENAME: &str = "following.json";

pub struct Config {
    pub instance_url: String,
    pub request_timeout: Duration,
    data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Config> {
        let instance_url = std::env::var("INVIDIOUS_INSTANCE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_INSTANCE_URL.into());

        let data_dir = match std::env::var_os("INVIDIOUS_PLUGIN_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("tv", "kodi", "invidious-plugin")
                .ok_or_else(|| anyhow::anyhow!("Unable to determine configuration directories"))?
                .data_dir()
                .to_path_buf(),
        };

        Ok(Config {
            instance_url,
            request_timeout: Duration::from_secs(5),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn following_path(&self) -> PathBuf {
        self.data_dir.join(FOLLOWING_FILENAME)
    }
}
