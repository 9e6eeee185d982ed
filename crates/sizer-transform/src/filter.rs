//! Filter chain
//!
//! Three optional predicates applied in a fixed order: power state, include,
//! exclude. Each active step yields a new dataset; none of them edits or
//! reorders records.

use crate::error::ConfigurationError;
use crate::matcher::SubstringMatcher;
use serde::{Deserialize, Serialize};
use sizer_model::{Dataset, PowerState, VmRecord};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Power-state selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerStateFilter {
    /// Keep every record
    #[default]
    #[serde(rename = "a")]
    KeepAll,
    /// Keep powered-on records
    #[serde(rename = "p")]
    PoweredOn,
    /// Keep powered-on and suspended records
    #[serde(rename = "ps")]
    PoweredOnOrSuspended,
}

impl PowerStateFilter {
    /// True for anything but [`PowerStateFilter::KeepAll`]
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        self != Self::KeepAll
    }

    /// Whether a record survives
    #[inline]
    #[must_use]
    pub fn keeps(self, record: &VmRecord) -> bool {
        match self {
            Self::KeepAll => true,
            Self::PoweredOn => record.power_state == PowerState::PoweredOn,
            Self::PoweredOnOrSuspended => matches!(
                record.power_state,
                PowerState::PoweredOn | PowerState::Suspended
            ),
        }
    }

    /// Apply to a dataset
    #[must_use]
    pub fn apply(self, dataset: &Dataset) -> Dataset {
        dataset.select(|r| self.keeps(r))
    }

    /// Short code (`a`, `p`, `ps`)
    #[inline]
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::KeepAll => "a",
            Self::PoweredOn => "p",
            Self::PoweredOnOrSuspended => "ps",
        }
    }
}

impl FromStr for PowerStateFilter {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "all" => Ok(Self::KeepAll),
            "p" | "on" | "powered_on" => Ok(Self::PoweredOn),
            "ps" | "on_suspended" => Ok(Self::PoweredOnOrSuspended),
            other => Err(ConfigurationError::unknown(
                "power_state",
                other,
                &["a", "p", "ps"],
            )),
        }
    }
}

impl fmt::Display for PowerStateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Record field a text filter inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterField {
    /// Cluster name
    #[serde(rename = "cluster")]
    Cluster,
    /// Datacenter name
    #[serde(rename = "datacenter")]
    Datacenter,
    /// Guest OS
    #[serde(rename = "os")]
    Os,
    /// VM name
    #[serde(rename = "vmName")]
    VmName,
    /// Guest hostname
    #[serde(rename = "hostname")]
    Hostname,
}

impl FilterField {
    /// All fields with their labels
    pub const ALL: [Self; 5] = [
        Self::Cluster,
        Self::Datacenter,
        Self::Os,
        Self::VmName,
        Self::Hostname,
    ];

    /// Configuration label
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Datacenter => "datacenter",
            Self::Os => "os",
            Self::VmName => "vmName",
            Self::Hostname => "hostname",
        }
    }

    /// The field's value on a record
    #[inline]
    #[must_use]
    pub fn value(self, record: &VmRecord) -> &str {
        match self {
            Self::Cluster => &record.cluster,
            Self::Datacenter => &record.datacenter,
            Self::Os => &record.guest_os,
            Self::VmName => &record.name,
            Self::Hostname => &record.guest_hostname,
        }
    }
}

impl FromStr for FilterField {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ConfigurationError::unknown(
                    "filter field",
                    s,
                    &Self::ALL.map(Self::label),
                )
            })
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether matching records are kept or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep records matching at least one substring
    Include,
    /// Keep records matching none of the substrings
    Exclude,
}

impl FilterMode {
    fn parameters(self) -> (&'static str, &'static str) {
        match self {
            Self::Include => ("include_field", "include_values"),
            Self::Exclude => ("exclude_field", "exclude_values"),
        }
    }
}

/// Include or exclude filter over one field
#[derive(Debug, Clone, PartialEq)]
pub struct TextFilter {
    mode: FilterMode,
    field: FilterField,
    matcher: SubstringMatcher,
}

impl TextFilter {
    /// Keep records whose `field` contains any substring (case-insensitive)
    ///
    /// # Errors
    /// Returns [`ConfigurationError::EmptyList`] when `substrings` is empty
    pub fn include(field: FilterField, substrings: &[String]) -> Result<Self, ConfigurationError> {
        Self::new(FilterMode::Include, field, substrings)
    }

    /// Keep records whose `field` contains none of the substrings
    ///
    /// # Errors
    /// Returns [`ConfigurationError::EmptyList`] when `substrings` is empty
    pub fn exclude(field: FilterField, substrings: &[String]) -> Result<Self, ConfigurationError> {
        Self::new(FilterMode::Exclude, field, substrings)
    }

    fn new(
        mode: FilterMode,
        field: FilterField,
        substrings: &[String],
    ) -> Result<Self, ConfigurationError> {
        let (_, values) = mode.parameters();
        Ok(Self {
            mode,
            field,
            matcher: SubstringMatcher::new(values, substrings)?,
        })
    }

    /// Build from an optional field / substring pair
    ///
    /// Both absent means no filter. Exactly one present is an error naming
    /// the missing half.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingParameter`] or
    /// [`ConfigurationError::EmptyList`]
    pub fn from_parts(
        mode: FilterMode,
        field: Option<FilterField>,
        substrings: Option<&[String]>,
    ) -> Result<Option<Self>, ConfigurationError> {
        let (field_param, values_param) = mode.parameters();
        match (field, substrings) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigurationError::missing(field_param, values_param)),
            (None, Some(_)) => Err(ConfigurationError::missing(values_param, field_param)),
            (Some(field), Some(values)) => Self::new(mode, field, values).map(Some),
        }
    }

    /// Include or exclude
    #[inline]
    #[must_use]
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Field inspected
    #[inline]
    #[must_use]
    pub fn field(&self) -> FilterField {
        self.field
    }

    /// Whether a record survives
    #[must_use]
    pub fn keeps(&self, record: &VmRecord) -> bool {
        let matched = self.matcher.is_match(self.field.value(record));
        match self.mode {
            FilterMode::Include => matched,
            FilterMode::Exclude => !matched,
        }
    }

    /// Apply to a dataset
    #[must_use]
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        dataset.select(|r| self.keeps(r))
    }
}

/// One step of the chain, with its artifact identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStep {
    /// Power-state filter
    PowerState,
    /// Include filter
    Include,
    /// Exclude filter
    Exclude,
}

impl FilterStep {
    /// Pipeline stage number
    #[inline]
    #[must_use]
    pub const fn stage(self) -> u8 {
        match self {
            Self::PowerState => 2,
            Self::Include => 3,
            Self::Exclude => 4,
        }
    }

    /// Artifact name of the step's output
    #[inline]
    #[must_use]
    pub const fn artifact_name(self) -> &'static str {
        match self {
            Self::PowerState => "2_vmdata_power_state",
            Self::Include => "3_vmdata_include",
            Self::Exclude => "4_vmdata_exclude",
        }
    }
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PowerState => "power-state",
            Self::Include => "include",
            Self::Exclude => "exclude",
        };
        f.write_str(label)
    }
}

/// Output of one active step
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredStage {
    /// Step that produced it
    pub step: FilterStep,
    /// Surviving records
    pub dataset: Dataset,
}

/// Power-state, include and exclude filters in fixed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    power_state: PowerStateFilter,
    include: Option<TextFilter>,
    exclude: Option<TextFilter>,
}

impl FilterChain {
    /// Chain with every step disabled
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set power-state filter
    #[inline]
    #[must_use]
    pub fn with_power_state(mut self, filter: PowerStateFilter) -> Self {
        self.power_state = filter;
        self
    }

    /// Set include filter
    #[inline]
    #[must_use]
    pub fn with_include(mut self, filter: Option<TextFilter>) -> Self {
        self.include = filter;
        self
    }

    /// Set exclude filter
    #[inline]
    #[must_use]
    pub fn with_exclude(mut self, filter: Option<TextFilter>) -> Self {
        self.exclude = filter;
        self
    }

    /// True when no step is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.power_state.is_active() && self.include.is_none() && self.exclude.is_none()
    }

    /// Run every active step, each on the previous step's output
    ///
    /// Returns one entry per active step, in order. Inactive steps produce no
    /// entry.
    #[must_use]
    pub fn apply(&self, dataset: &Dataset) -> Vec<FilteredStage> {
        let mut stages = Vec::with_capacity(3);
        let mut current = dataset.clone();

        if self.power_state.is_active() {
            current = self.power_state.apply(&current);
            stages.push(FilteredStage {
                step: FilterStep::PowerState,
                dataset: current.clone(),
            });
        }
        for (step, filter) in [
            (FilterStep::Include, &self.include),
            (FilterStep::Exclude, &self.exclude),
        ] {
            if let Some(filter) = filter {
                current = filter.apply(&current);
                stages.push(FilteredStage {
                    step,
                    dataset: current.clone(),
                });
            }
        }

        for stage in &stages {
            info!(
                "{} filter kept {} of {} VMs",
                stage.step,
                stage.dataset.len(),
                dataset.len()
            );
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn record(id: &str, cluster: &str, state: PowerState) -> VmRecord {
        VmRecord::builder(id).name(id).cluster(cluster).power_state(state).build()
    }

    fn dataset() -> Dataset {
        vec![
            record("a", "prod-east", PowerState::PoweredOn),
            record("b", "prod-west", PowerState::Suspended),
            record("c", "dev", PowerState::PoweredOff),
            record("d", "Prod-Lab", PowerState::PoweredOn),
        ]
        .into()
    }

    #[test]
    fn power_state_filters() {
        let data = dataset();
        assert_eq!(PowerStateFilter::KeepAll.apply(&data).len(), 4);
        assert_eq!(PowerStateFilter::PoweredOn.apply(&data).ids(), vec!["a", "d"]);
        assert_eq!(
            PowerStateFilter::PoweredOnOrSuspended.apply(&data).ids(),
            vec!["a", "b", "d"]
        );
    }

    #[test]
    fn power_state_codes_parse() {
        assert_eq!("p".parse::<PowerStateFilter>(), Ok(PowerStateFilter::PoweredOn));
        assert_eq!("PS".parse::<PowerStateFilter>(), Ok(PowerStateFilter::PoweredOnOrSuspended));
        assert!("x".parse::<PowerStateFilter>().is_err());
    }

    #[test]
    fn field_labels_parse() {
        assert_eq!("vmName".parse::<FilterField>(), Ok(FilterField::VmName));
        assert_eq!("HOSTNAME".parse::<FilterField>(), Ok(FilterField::Hostname));
        assert!("folder".parse::<FilterField>().is_err());
    }

    #[test]
    fn include_is_case_insensitive() {
        let filter = TextFilter::include(FilterField::Cluster, &strings(&["prod"])).unwrap();
        assert_eq!(filter.apply(&dataset()).ids(), vec!["a", "b", "d"]);
    }

    #[test]
    fn exclude_drops_matches() {
        let filter = TextFilter::exclude(FilterField::Cluster, &strings(&["east", "lab"])).unwrap();
        assert_eq!(filter.apply(&dataset()).ids(), vec!["b", "c"]);
    }

    #[test]
    fn from_parts_names_missing_parameter() {
        let values = strings(&["prod"]);
        assert_eq!(
            TextFilter::from_parts(FilterMode::Include, Some(FilterField::Os), None),
            Err(ConfigurationError::missing("include_field", "include_values"))
        );
        assert_eq!(
            TextFilter::from_parts(FilterMode::Exclude, None, Some(&values)),
            Err(ConfigurationError::missing("exclude_values", "exclude_field"))
        );
        assert_eq!(TextFilter::from_parts(FilterMode::Include, None, None), Ok(None));
        assert!(TextFilter::from_parts(FilterMode::Include, Some(FilterField::Os), Some(&values))
            .unwrap()
            .is_some());
    }

    #[test]
    fn chain_runs_active_steps_in_order() {
        let chain = FilterChain::new()
            .with_power_state(PowerStateFilter::PoweredOnOrSuspended)
            .with_include(Some(
                TextFilter::include(FilterField::Cluster, &strings(&["prod"])).unwrap(),
            ))
            .with_exclude(Some(
                TextFilter::exclude(FilterField::VmName, &strings(&["d"])).unwrap(),
            ));

        let stages = chain.apply(&dataset());
        let steps: Vec<FilterStep> = stages.iter().map(|s| s.step).collect();
        assert_eq!(
            steps,
            vec![FilterStep::PowerState, FilterStep::Include, FilterStep::Exclude]
        );
        assert_eq!(stages[0].dataset.ids(), vec!["a", "b", "d"]);
        assert_eq!(stages[1].dataset.ids(), vec!["a", "b", "d"]);
        assert_eq!(stages[2].dataset.ids(), vec!["a", "b"]);
    }

    #[test]
    fn empty_chain_produces_no_stages() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert!(chain.apply(&dataset()).is_empty());
    }

    #[test]
    fn step_artifact_names() {
        assert_eq!(FilterStep::PowerState.artifact_name(), "2_vmdata_power_state");
        assert_eq!(FilterStep::Exclude.stage(), 4);
    }
}
