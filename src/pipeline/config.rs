// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pipeline configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`PipelineConfig::load`]
pub const CONFIG_FILE: &str = "meshadapt.toml";

/// Defect classes that stop the hand-off to the volume mesher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbortPolicy {
    pub orientation_errors: bool,
    pub leftovers: bool,
    pub topology_defects: bool,
    pub geometry_defects: bool,
    pub sign_conflicts: bool,
}

impl Default for AbortPolicy {
    fn default() -> Self {
        Self {
            orientation_errors: true,
            leftovers: true,
            topology_defects: true,
            geometry_defects: true,
            sign_conflicts: true,
        }
    }
}

impl AbortPolicy {
    /// Report every defect but never block the hand-off
    pub fn never() -> Self {
        Self {
            orientation_errors: false,
            leftovers: false,
            topology_defects: false,
            geometry_defects: false,
            sign_conflicts: false,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the topology validator
    pub check_topology: bool,
    /// Run the geometry validator
    pub check_geometry: bool,
    /// Sew coincident vertices at the end
    pub sew: bool,
    /// Worker count for the geometry check (None = rayon default)
    pub parallelism: Option<usize>,
    /// Spread geometry pair tests over a worker pool
    pub parallel_geometry: bool,
    /// Prune geometry pair tests with a bounding volume hierarchy
    pub broad_phase: bool,
    pub abort_on: AbortPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            check_topology: true,
            check_geometry: true,
            sew: true,
            parallelism: None, // Auto-detect
            parallel_geometry: false,
            broad_phase: true,
            abort_on: AbortPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: PipelineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `meshadapt.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `MESHADAPT_*` overrides read through `lookup`.
    ///
    /// Unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(parallelism) = lookup("MESHADAPT_PARALLELISM") {
            self.parallelism = parallelism.parse().ok().filter(|&n: &usize| n > 0);
        }

        if let Some(parallel) = lookup("MESHADAPT_PARALLEL_GEOMETRY") {
            self.parallel_geometry = parallel.parse().unwrap_or(self.parallel_geometry);
        }

        if let Some(broad_phase) = lookup("MESHADAPT_BROAD_PHASE") {
            self.broad_phase = broad_phase.parse().unwrap_or(self.broad_phase);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_single_threaded() {
        let config = PipelineConfig::default();
        assert!(!config.parallel_geometry);
        assert!(config.broad_phase);
        assert!(config.abort_on.geometry_defects);
    }

    #[test]
    fn test_overrides() {
        let mut config = PipelineConfig::default();
        config.apply_overrides(|key| match key {
            "MESHADAPT_PARALLELISM" => Some("4".to_string()),
            "MESHADAPT_PARALLEL_GEOMETRY" => Some("true".to_string()),
            "MESHADAPT_BROAD_PHASE" => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config.parallelism, Some(4));
        assert!(config.parallel_geometry);
        assert!(config.broad_phase);

        config.apply_overrides(|key| (key == "MESHADAPT_PARALLELISM").then(|| "0".to_string()));
        assert_eq!(config.parallelism, None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str(
            "sew = false\n[abort_on]\ngeometry_defects = false\n",
        )
        .unwrap();
        assert!(!config.sew);
        assert!(config.check_topology);
        assert!(!config.abort_on.geometry_defects);
        assert!(config.abort_on.leftovers);
    }
}
