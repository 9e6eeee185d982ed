//! Pipeline orchestrator
//!
//! Runs the stages in order, each fully materialized before the next:
//!
//! 1. ingest → `1_vmdata_<tool>`
//! 2. power-state filter → `2_vmdata_power_state`
//! 3. include filter → `3_vmdata_include`
//! 4. exclude filter → `4_vmdata_exclude`
//! 5. partition → `5_*` profiles and `5_profiles_manifest.json`
//! 6. assemble → `6_sizer_request.json`
//!
//! Inactive filters write nothing. A run can also start from a stored
//! dataset ([`Pipeline::run_from_dataset`]) or rebuild only the request
//! from a stored manifest ([`Pipeline::payload_from_manifest`]).

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::store::{ArtifactStore, ProfileManifest};
use crate::warning::EmptyResultWarning;
use serde::Serialize;
use sizer_ingest::{Ingestor, SchemaRegistry, Workbook};
use sizer_model::{Artifact, Dataset, DatasetSummary, Profile};
use sizer_payload::{PayloadAssembler, SizerRequest};
use sizer_transform::{GroupingStrategy, PROFILE_PREFIX};
use std::path::{Path, PathBuf};
use tracing::info;

/// Stage number of ingestion
pub const INGEST_STAGE: u8 = 1;

/// Stage number of partitioning
pub const PARTITION_STAGE: u8 = 5;

/// Artifact name of the single profile written when no strategy is set
pub const UNPARTITIONED_ARTIFACT: &str = "5_unpartitioned";

/// One artifact written (or read) by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Artifact name
    pub artifact: String,
    /// Stage number
    pub stage: u8,
    /// Records in the artifact
    pub records: usize,
}

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Dataset and profile artifacts in stage order
    pub stages: Vec<StageReport>,
    /// Profile names in request order
    pub profiles: Vec<String>,
    /// The assembled request
    pub request: Option<SizerRequest>,
    /// Audit copy of the request
    pub request_path: Option<PathBuf>,
    /// Empty-result warnings raised along the way
    pub warnings: Vec<EmptyResultWarning>,
}

impl RunOutcome {
    /// Check if any stage came out empty
    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn record<T: sizer_model::ArtifactContent>(&mut self, artifact: &Artifact<T>) {
        self.stages.push(StageReport {
            artifact: artifact.name().to_string(),
            stage: artifact.stage(),
            records: artifact.record_count(),
        });
    }
}

/// Sequences the stages over one [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    store: ArtifactStore,
    registry: SchemaRegistry,
}

impl Pipeline {
    /// Create a pipeline over a validated configuration
    ///
    /// # Errors
    /// Returns the first invalid filter, partition or sizing parameter
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate_settings()?;
        let store = ArtifactStore::new(&config.output_dir);
        Ok(Self {
            config,
            store,
            registry: SchemaRegistry::with_defaults(),
        })
    }

    /// Use a custom layout registry
    #[inline]
    #[must_use]
    pub fn with_schema_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Artifact store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.config.tool).with_registry(self.registry.clone())
    }

    /// Summarize the configured inputs without writing anything
    ///
    /// # Errors
    /// Returns error if there are no inputs or they cannot be normalized
    pub fn describe(&self) -> PipelineResult<DatasetSummary> {
        self.config.validate()?;
        let dataset = self.ingestor().ingest_paths(&self.config.inputs)?;
        Ok(DatasetSummary::of(&dataset))
    }

    /// Summarize already opened workbooks
    ///
    /// # Errors
    /// Returns error if the workbooks cannot be normalized
    pub fn describe_workbooks<W, I>(&self, workbooks: I) -> PipelineResult<DatasetSummary>
    where
        W: Workbook,
        I: IntoIterator<Item = W>,
    {
        let dataset = self.ingestor().ingest(workbooks)?;
        Ok(DatasetSummary::of(&dataset))
    }

    /// Run every stage on the configured input files
    ///
    /// # Errors
    /// Returns the first fatal stage error; nothing is read before the
    /// configuration has been validated
    pub fn run(&self) -> PipelineResult<RunOutcome> {
        self.config.validate()?;
        let mut outcome = RunOutcome::default();
        let dataset = self.ingestor().ingest_paths(&self.config.inputs)?;
        let dataset = self.store_dataset(dataset, &mut outcome)?;
        self.run_stages(dataset, outcome)
    }

    /// Run every stage on already opened workbooks
    ///
    /// # Errors
    /// Returns the first fatal stage error
    pub fn run_workbooks<W, I>(&self, workbooks: I) -> PipelineResult<RunOutcome>
    where
        W: Workbook,
        I: IntoIterator<Item = W>,
    {
        let mut outcome = RunOutcome::default();
        let dataset = self.ingestor().ingest(workbooks)?;
        let dataset = self.store_dataset(dataset, &mut outcome)?;
        self.run_stages(dataset, outcome)
    }

    /// Filter, partition and assemble starting from a stored dataset
    ///
    /// # Errors
    /// Returns error if the artifact is missing or fails verification, or
    /// a later stage fails
    pub fn run_from_dataset(&self, path: &Path) -> PipelineResult<RunOutcome> {
        let dataset = self.store.load_path::<Dataset>(path)?;
        info!(
            "Resuming from {} ({} VMs)",
            dataset.name(),
            dataset.record_count()
        );
        let mut outcome = RunOutcome::default();
        outcome.record(&dataset);
        self.run_stages(dataset, outcome)
    }

    /// Rebuild the request from the stored profile manifest
    ///
    /// # Errors
    /// Returns error if the manifest or a listed profile is missing or has
    /// changed, or the request cannot be assembled
    pub fn payload_from_manifest(&self) -> PipelineResult<RunOutcome> {
        let manifest = self.store.load_manifest()?;
        let artifacts = self.store.load_manifest_profiles(&manifest)?;
        info!(
            "Loaded {} profiles from manifest of {}",
            artifacts.len(),
            manifest.source
        );

        let mut outcome = RunOutcome::default();
        for artifact in &artifacts {
            outcome.record(artifact);
        }
        let profiles: Vec<Profile> = artifacts.into_iter().map(Artifact::into_content).collect();
        self.assemble(&profiles, &mut outcome)?;
        Ok(outcome)
    }

    fn run_stages(
        &self,
        dataset: Artifact<Dataset>,
        mut outcome: RunOutcome,
    ) -> PipelineResult<RunOutcome> {
        let last = self.filter(dataset, &mut outcome)?;
        let profiles = self.partition(&last, &mut outcome)?;
        let profiles: Vec<Profile> = profiles.into_iter().map(Artifact::into_content).collect();
        self.assemble(&profiles, &mut outcome)?;
        Ok(outcome)
    }

    fn store_dataset(
        &self,
        dataset: Dataset,
        outcome: &mut RunOutcome,
    ) -> PipelineResult<Artifact<Dataset>> {
        let artifact = Artifact::new(self.config.dataset_artifact(), INGEST_STAGE, dataset)?;
        self.store.save(&artifact)?;
        if artifact.content().is_empty() {
            outcome
                .warnings
                .push(EmptyResultWarning::raise(artifact.name(), INGEST_STAGE, 0));
        }
        outcome.record(&artifact);
        Ok(artifact)
    }

    /// Apply the filter chain, saving one artifact per active step
    ///
    /// Returns the last dataset produced, or the input when no filter is
    /// active.
    ///
    /// # Errors
    /// Returns error if the filters are misconfigured or a write fails
    pub fn filter(
        &self,
        dataset: Artifact<Dataset>,
        outcome: &mut RunOutcome,
    ) -> PipelineResult<Artifact<Dataset>> {
        let chain = self.config.filter_chain()?;
        let mut last = dataset;
        for stage in chain.apply(last.content()) {
            let input_records = last.record_count();
            let artifact = Artifact::new(
                stage.step.artifact_name(),
                stage.step.stage(),
                stage.dataset,
            )?;
            self.store.save(&artifact)?;
            if artifact.content().is_empty() {
                outcome.warnings.push(EmptyResultWarning::raise(
                    artifact.name(),
                    artifact.stage(),
                    input_records,
                ));
            }
            outcome.record(&artifact);
            last = artifact;
        }
        Ok(last)
    }

    /// Partition the dataset and save profiles plus manifest
    ///
    /// Without a configured strategy the whole dataset becomes one profile
    /// named after its artifact.
    ///
    /// # Errors
    /// Returns error if the strategy is misconfigured or a write fails
    pub fn partition(
        &self,
        dataset: &Artifact<Dataset>,
        outcome: &mut RunOutcome,
    ) -> PipelineResult<Vec<Artifact<Profile>>> {
        let strategy = self.config.strategy()?;
        let artifacts = match &strategy {
            Some(strategy) => strategy
                .partition(dataset.content())?
                .into_profiles()
                .into_iter()
                .map(|p| Artifact::new(p.name.clone(), PARTITION_STAGE, p))
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                let profile = Profile::unpartitioned(dataset.name(), dataset.content().clone());
                vec![Artifact::new(UNPARTITIONED_ARTIFACT, PARTITION_STAGE, profile)?]
            }
        };

        if artifacts.is_empty() {
            outcome.warnings.push(EmptyResultWarning::raise(
                format!("{PROFILE_PREFIX}profiles"),
                PARTITION_STAGE,
                dataset.record_count(),
            ));
        }
        for artifact in &artifacts {
            self.store.save(artifact)?;
            if artifact.content().is_empty() {
                outcome.warnings.push(EmptyResultWarning::raise(
                    artifact.name(),
                    PARTITION_STAGE,
                    dataset.record_count(),
                ));
            }
            outcome.record(artifact);
        }

        let manifest = ProfileManifest::new(dataset.name(), strategy, &artifacts);
        self.store.save_manifest(&manifest)?;
        Ok(artifacts)
    }

    /// Assemble the request and write its audit copy
    ///
    /// # Errors
    /// Returns [`sizer_payload::PayloadError::NoProfiles`] for an empty list,
    /// or error if the audit copy cannot be written
    pub fn assemble(
        &self,
        profiles: &[Profile],
        outcome: &mut RunOutcome,
    ) -> PipelineResult<SizerRequest> {
        let request = PayloadAssembler::new(self.config.sizing.clone())
            .with_storage_policy(self.config.storage_policy)
            .assemble(profiles)?;
        let path = self.store.save_request(&request)?;

        outcome.profiles = profiles.iter().map(|p| p.name.clone()).collect();
        outcome.request = Some(request.clone());
        outcome.request_path = Some(path);
        Ok(request)
    }
}
