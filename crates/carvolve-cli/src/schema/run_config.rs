use std::path::Path;

use anyhow::Context as _;
use carvolve_track::TrackConfig;
use carvolve_training::TrainingConfig;
use serde::{Deserialize, Serialize};

use crate::util;

/// Contents of a `--config` file.
///
/// Both sections are optional and every field in them falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub training: TrainingConfig,
    pub track: TrackConfig,
}

impl RunConfig {
    /// Reads the config file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => util::read_json_file("config", path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.training
            .validate()
            .context("Invalid training configuration")?;
        self.track.validate().context("Invalid track configuration")?;
        Ok(())
    }
}
