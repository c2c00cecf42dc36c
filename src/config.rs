use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::FinderResult;
use crate::identify::DEFAULT_THRESHOLD_DEG;
use crate::precision::AnglePrecision;

const CONFIG_FILE_NAME: &str = "skyfind.toml";
pub const BODIES_GROUP: &str = "bodies";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub observer: Option<ObserverConfig>,
    pub output: OutputConfig,
    pub identify: IdentifyConfig,
    pub logging: LoggingConfig,
    pub groups: BTreeMap<String, GroupConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ObserverConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub precision: AnglePrecision,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IdentifyConfig {
    pub default_threshold: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub tle_file: PathBuf,
    pub url: Option<String>,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD_DEG,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            observer: None,
            output: OutputConfig::default(),
            identify: IdentifyConfig::default(),
            logging: LoggingConfig::default(),
            groups: default_groups(),
        }
    }
}

fn default_groups() -> BTreeMap<String, GroupConfig> {
    let mut groups = BTreeMap::new();
    groups.insert(
        "brightest".to_string(),
        GroupConfig {
            tle_file: PathBuf::from("data/brightest.tle"),
            url: Some(
                "https://celestrak.org/NORAD/elements/gp.php?GROUP=VISUAL&FORMAT=TLE".to_string(),
            ),
        },
    );
    groups.insert(
        "gps".to_string(),
        GroupConfig {
            tle_file: PathBuf::from("data/gps.tle"),
            url: Some(
                "https://celestrak.org/NORAD/elements/gp.php?GROUP=gps-ops&FORMAT=tle".to_string(),
            ),
        },
    );
    groups
}

impl Config {
    pub fn load(path: &Path) -> FinderResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> FinderResult<Self> {
        let mut config: Config = toml::from_str(contents)?;
        if config.groups.is_empty() {
            config.groups = default_groups();
        }
        Ok(config)
    }

    /// Explicit path, else `./skyfind.toml`, else the user config directory,
    /// else built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> FinderResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidates = [
            Some(PathBuf::from(CONFIG_FILE_NAME)),
            dirs::config_dir().map(|dir| dir.join("skyfind").join("config.toml")),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "using configuration file");
                return Self::load(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn group(&self, name: &str) -> Option<&GroupConfig> {
        self.groups.get(name)
    }
}
