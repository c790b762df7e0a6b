use anyhow::Context;
use gfc_schema::config::FanControlSettings;
use nix::unistd::getuid;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

const FILE_NAME: &str = "config.yaml";
const DIR_NAME: &str = "gfc";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub daemon: Daemon,
    #[serde(default)]
    pub fan_control: FanControlSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Daemon {
    pub log_level: String,
}

impl Default for Daemon {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let raw_config = fs::read_to_string(path)
            .with_context(|| format!("Could not open config file '{}'", path.display()))?;
        let config = serde_yml::from_str(&raw_config).context("Could not deserialize config")?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        debug!("saving config to {path:?}");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Could not create config directory")?;
        }
        let raw_config = serde_yml::to_string(self)?;
        fs::write(path, raw_config).context("Could not write config")
    }

    /// Loads the config from `path`, writing the defaults there first if it does not exist yet.
    pub fn load_or_create_at(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn load_or_create() -> anyhow::Result<Self> {
        Self::load_or_create_at(&get_path()?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.fan_control
            .policy
            .validate()
            .context("Invalid fan speed policy")?;
        anyhow::ensure!(
            self.fan_control.interval_ms > 0,
            "Fan control interval must be greater than 0"
        );
        if let Some(ratio) = self.fan_control.fallback_speed {
            anyhow::ensure!(
                (0.0..=1.0).contains(&ratio),
                "Fallback fan speed must be between 0 and 1, got {ratio}"
            );
        }
        Ok(())
    }
}

fn get_path() -> anyhow::Result<PathBuf> {
    let uid = getuid();
    if uid.is_root() {
        Ok(PathBuf::from("/etc").join(DIR_NAME).join(FILE_NAME))
    } else {
        let config_dir = match env::var("XDG_CONFIG_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => {
                let home = env::var("HOME").context("$HOME variable is not set")?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(config_dir.join(DIR_NAME).join(FILE_NAME))
    }
}
