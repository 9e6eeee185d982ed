//! Pipeline configuration
//!
//! One [`PipelineConfig`] is built at the top level, from a file and/or CLI
//! flags, and handed to [`crate::Pipeline`]. Files are YAML, JSON or TOML,
//! chosen by extension; every field is optional and falls back to its
//! default.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use sizer_ingest::{IngestionError, SourceTool};
use sizer_payload::{SizingConfiguration, StoragePolicy};
use sizer_transform::{
    ConfigurationError, FilterChain, FilterField, FilterMode, PartitionStrategy, PowerStateFilter,
    StrategyRegistry, TextFilter,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Everything a run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tool that produced every input file
    pub tool: SourceTool,
    /// Workbook files, read in order
    pub inputs: Vec<PathBuf>,
    /// Where artifacts and the request are written
    pub output_dir: PathBuf,
    /// Power-state selection
    pub power_state: PowerStateFilter,
    /// Include filter field
    pub include_field: Option<FilterField>,
    /// Include filter substrings
    pub include_values: Option<Vec<String>>,
    /// Exclude filter field
    pub exclude_field: Option<FilterField>,
    /// Exclude filter substrings
    pub exclude_values: Option<Vec<String>>,
    /// Grouping strategy name; no partitioning when absent
    pub partition: Option<String>,
    /// Clusters or substrings for the grouping strategy
    pub profile_list: Option<Vec<String>>,
    /// Collect unmatched records into a remainder profile
    pub include_remainder: bool,
    /// Storage figure reported to the sizer
    pub storage_policy: StoragePolicy,
    /// Pass-through sizing block
    pub sizing: SizingConfiguration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tool: SourceTool::RvTools,
            inputs: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            power_state: PowerStateFilter::KeepAll,
            include_field: None,
            include_values: None,
            exclude_field: None,
            exclude_values: None,
            partition: None,
            profile_list: None,
            include_remainder: false,
            storage_policy: StoragePolicy::default(),
            sizing: SizingConfiguration::default(),
        }
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl PipelineConfig {
    /// Create default configuration for a tool
    #[inline]
    #[must_use]
    pub fn new(tool: SourceTool) -> Self {
        Self {
            tool,
            ..Self::default()
        }
    }

    /// Load from a YAML, JSON or TOML file
    ///
    /// # Errors
    /// Returns [`PipelineError::Io`] if the file cannot be read, or
    /// [`PipelineError::ConfigFile`] for an unknown extension or bad content
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::of(path).ok_or_else(|| {
            PipelineError::config_file(path, "unsupported extension (use .yaml, .json or .toml)")
        })?;
        let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config = match format {
            ConfigFormat::Yaml => Self::from_yaml(&text),
            ConfigFormat::Json => Self::from_json(&text),
            ConfigFormat::Toml => Self::from_toml(&text),
        };
        config.map_err(|message| PipelineError::config_file(path, message))
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// Returns the parser message
    pub fn from_yaml(text: &str) -> Result<Self, String> {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    /// Parse JSON text
    ///
    /// # Errors
    /// Returns the parser message
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns the parser message
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// With input files
    #[inline]
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.inputs = inputs;
        self
    }

    /// With output directory
    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// With power-state filter
    #[inline]
    #[must_use]
    pub fn with_power_state(mut self, filter: PowerStateFilter) -> Self {
        self.power_state = filter;
        self
    }

    /// With include filter
    #[inline]
    #[must_use]
    pub fn with_include(mut self, field: FilterField, values: Vec<String>) -> Self {
        self.include_field = Some(field);
        self.include_values = Some(values);
        self
    }

    /// With exclude filter
    #[inline]
    #[must_use]
    pub fn with_exclude(mut self, field: FilterField, values: Vec<String>) -> Self {
        self.exclude_field = Some(field);
        self.exclude_values = Some(values);
        self
    }

    /// With grouping strategy
    #[inline]
    #[must_use]
    pub fn with_partition(
        mut self,
        strategy: impl Into<String>,
        profile_list: Option<Vec<String>>,
        include_remainder: bool,
    ) -> Self {
        self.partition = Some(strategy.into());
        self.profile_list = profile_list;
        self.include_remainder = include_remainder;
        self
    }

    /// With storage policy
    #[inline]
    #[must_use]
    pub fn with_storage_policy(mut self, policy: StoragePolicy) -> Self {
        self.storage_policy = policy;
        self
    }

    /// With sizing block
    #[inline]
    #[must_use]
    pub fn with_sizing(mut self, sizing: SizingConfiguration) -> Self {
        self.sizing = sizing;
        self
    }

    /// Artifact name of the canonical dataset
    #[must_use]
    pub fn dataset_artifact(&self) -> String {
        format!("1_vmdata_{}", self.tool)
    }

    /// Build the filter chain
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if a filter field is given without its
    /// substrings, or the other way round
    pub fn filter_chain(&self) -> Result<FilterChain, ConfigurationError> {
        let include = TextFilter::from_parts(
            FilterMode::Include,
            self.include_field,
            self.include_values.as_deref(),
        )?;
        let exclude = TextFilter::from_parts(
            FilterMode::Exclude,
            self.exclude_field,
            self.exclude_values.as_deref(),
        )?;
        Ok(FilterChain::new()
            .with_power_state(self.power_state)
            .with_include(include)
            .with_exclude(exclude))
    }

    /// Build the grouping strategy, if one is configured
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] for an unknown strategy, a strategy
    /// missing its list, or a list given without a strategy
    pub fn strategy(&self) -> Result<Option<PartitionStrategy>, ConfigurationError> {
        match (&self.partition, &self.profile_list) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ConfigurationError::missing("profile_list", "partition")),
            (Some(name), list) => {
                let registry = StrategyRegistry::with_defaults();
                let needs_list = !name.trim().eq_ignore_ascii_case("all_clusters");
                if needs_list && list.is_none() {
                    return Err(ConfigurationError::missing("partition", "profile_list"));
                }
                registry
                    .build(name, list.clone().unwrap_or_default(), self.include_remainder)
                    .map(Some)
            }
        }
    }

    /// Check everything except the input list
    ///
    /// # Errors
    /// Returns the first invalid filter, partition or sizing parameter
    pub fn validate_settings(&self) -> PipelineResult<()> {
        self.filter_chain()?;
        self.strategy()?;
        self.sizing.validate()?;
        Ok(())
    }

    /// Check the whole configuration before any file is read
    ///
    /// # Errors
    /// Returns [`IngestionError::NoInputFiles`] for an empty input list, or
    /// the first invalid parameter
    pub fn validate(&self) -> PipelineResult<()> {
        if self.inputs.is_empty() {
            return Err(IngestionError::NoInputFiles.into());
        }
        self.validate_settings()
    }
}
