use std::path::Path;

use serde::Deserialize;

use crate::errors::GcStatsError;

/// Groups with fewer objects than this are dropped from summaries and plots.
pub const DEFAULT_MIN_OBJECTS: usize = 1000;

const DEFAULT_CONFIG_NAME: &str = "gcstats.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub summary: SummaryConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    pub min_objects: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_objects: DEFAULT_MIN_OBJECTS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    /// Chart width in pixels.
    pub width: u32,
    /// Vertical pixels allotted per bar; chart height scales with group count.
    pub bar_height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1400,
            bar_height: 60,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit path, the file must exist and parse. Without one,
    /// `gcstats.toml` in the current directory is used if present, and the
    /// defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, GcStatsError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_NAME);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, GcStatsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| GcStatsError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|e| GcStatsError::ConfigParse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}
