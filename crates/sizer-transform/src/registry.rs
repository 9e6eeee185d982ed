//! Strategy registry
//!
//! Maps configuration names to [`PartitionStrategy`] variants.

use crate::error::ConfigurationError;
use crate::strategy::PartitionStrategy;
use std::collections::BTreeSet;

/// Names of the built-in grouping strategies
pub const BUILTIN_STRATEGIES: [&str; 4] = ["all_clusters", "some_clusters", "guest_os", "vm_name"];

/// Registry of selectable strategy names
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: BTreeSet<&'static str>,
}

impl StrategyRegistry {
    /// Create registry with built-in strategies
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            strategies: BUILTIN_STRATEGIES.into_iter().collect(),
        }
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().copied().collect()
    }

    /// Build the named strategy with its parameters
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnknownValue`] if the name is not
    /// registered, or the strategy's validation error
    pub fn build(
        &self,
        name: &str,
        values: Vec<String>,
        include_remainder: bool,
    ) -> Result<PartitionStrategy, ConfigurationError> {
        let key = name.trim().to_ascii_lowercase();
        if !self.strategies.contains(key.as_str()) {
            return Err(ConfigurationError::unknown(
                "partition strategy",
                name,
                &self.names(),
            ));
        }
        PartitionStrategy::from_name(&key, values, include_remainder)
    }
}
