use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::quality::approval::ApprovalCriteria;
use crate::quality::scorer::StageWeights;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Approval thresholds used when a request does not bring its own
    #[serde(default)]
    pub approval: ApprovalCriteria,

    /// Stage weights for the overall score
    #[serde(default)]
    pub weights: StageWeights,

    /// Orchestration settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Source validation settings
    #[serde(default)]
    pub sources: SourceSettings,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Orchestration settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineSettings {
    // @field: Default refinement budget when a request does not set one
    #[serde(default = "default_max_refinement_iterations")]
    pub max_refinement_iterations: u32,

    // @field: Per-stage timeout in seconds
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    // @field: Seed for the synonym strategy
    #[serde(default = "default_variation_seed")]
    pub variation_seed: u64,
}

impl PipelineSettings {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_refinement_iterations: default_max_refinement_iterations(),
            stage_timeout_secs: default_stage_timeout_secs(),
            variation_seed: default_variation_seed(),
        }
    }
}

/// Source validation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SourceSettings {
    // @field: Probe every linked source over HTTP
    #[serde(default)]
    pub check_reachability: bool,

    // @field: Probe timeout in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    // @field: Sources older than this many years are flagged
    #[serde(default = "default_stale_after_years")]
    pub stale_after_years: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            check_reachability: false,
            probe_timeout_secs: default_probe_timeout_secs(),
            stale_after_years: default_stale_after_years(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_max_refinement_iterations() -> u32 {
    3
}

fn default_stage_timeout_secs() -> u64 {
    10
}

fn default_variation_seed() -> u64 {
    42
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_stale_after_years() -> u32 {
    5
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.weights.validate().context("Invalid stage weights")?;
        self.approval.validate().context("Invalid approval criteria")?;

        if self.pipeline.max_refinement_iterations == 0 {
            return Err(anyhow!("pipeline.max_refinement_iterations must be at least 1"));
        }
        if self.pipeline.stage_timeout_secs == 0 {
            return Err(anyhow!("pipeline.stage_timeout_secs must be at least 1"));
        }
        if self.sources.check_reachability && self.sources.probe_timeout_secs == 0 {
            return Err(anyhow!("sources.probe_timeout_secs must be at least 1"));
        }

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))
    }

    /// Load the configuration, creating a default file when none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}

/// Configuration handle shared between runs
///
/// Each run takes a snapshot; replacing the configuration never affects a
/// run already holding one.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<Config>>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current configuration
    pub fn snapshot(&self) -> Arc<Config> {
        Arc::clone(&self.inner.read())
    }

    /// Swap in a new configuration after validating it
    pub fn replace(&self, config: Config) -> Result<()> {
        config.validate().context("Configuration validation failed")?;
        *self.inner.write() = Arc::new(config);
        Ok(())
    }

    /// Reload from disk; the previous configuration stays active on error
    pub fn reload_from<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Config>> {
        let config = Config::load(path)?;
        self.replace(config)?;
        Ok(self.snapshot())
    }
}
