//! Artifact store
//!
//! Stage outputs live as `<name>.json` files in one output directory. Every
//! write goes to a temporary file in the same directory and is renamed into
//! place, so a failed stage never leaves a partial artifact behind.

use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sizer_model::{Artifact, ArtifactContent, ContentHash, Dataset, Profile};
use sizer_payload::SizerRequest;
use sizer_transform::PartitionStrategy;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// File name of the profile manifest
pub const MANIFEST_FILE: &str = "5_profiles_manifest.json";

/// File name of the request audit copy
pub const REQUEST_FILE: &str = "6_sizer_request.json";

/// One profile listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Profile artifact name
    pub name: String,
    /// Member count
    pub record_count: usize,
    /// Content hash of the profile artifact
    pub content_hash: ContentHash,
    /// Whether this is the remainder profile
    #[serde(default)]
    pub remainder: bool,
}

/// Index of the profiles produced by one partitioning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileManifest {
    /// Dataset artifact that was partitioned
    pub source: String,
    /// Strategy used; `None` for an unpartitioned run
    pub strategy: Option<PartitionStrategy>,
    /// When the manifest was written
    pub created_at: DateTime<Utc>,
    /// Profiles in request order
    pub profiles: Vec<ManifestEntry>,
}

impl ProfileManifest {
    /// Build a manifest for saved profile artifacts
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        strategy: Option<PartitionStrategy>,
        profiles: &[Artifact<Profile>],
    ) -> Self {
        Self {
            source: source.into(),
            strategy,
            created_at: Utc::now(),
            profiles: profiles
                .iter()
                .map(|a| ManifestEntry {
                    name: a.name().to_string(),
                    record_count: a.record_count(),
                    content_hash: *a.content_hash(),
                    remainder: a.content().remainder,
                })
                .collect(),
        }
    }

    /// Profile names in request order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Directory of stage artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at a directory
    ///
    /// Nothing touches the filesystem until the first write, which creates
    /// the directory.
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a named artifact
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Check whether an artifact exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Write bytes atomically
    ///
    /// # Errors
    /// Returns [`PipelineError::Io`] if the temp file cannot be written or
    /// renamed
    pub fn write_atomic(&self, path: &Path, bytes: &[u8]) -> PipelineResult<()> {
        let dir = path.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
        tmp.write_all(bytes).map_err(|e| PipelineError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| PipelineError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| PipelineError::io(path, e.error))?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn read(&self, path: &Path) -> PipelineResult<String> {
        fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
    }

    /// Save an artifact under its own name
    ///
    /// # Errors
    /// Returns error if encoding or writing fails
    pub fn save<T: ArtifactContent>(&self, artifact: &Artifact<T>) -> PipelineResult<PathBuf> {
        let path = self.path_for(artifact.name());
        self.write_atomic(&path, artifact.to_json()?.as_bytes())?;
        info!(
            "Saved {} ({} records) to {}",
            artifact.name(),
            artifact.record_count(),
            path.display()
        );
        Ok(path)
    }

    /// Load and verify an artifact from a file
    ///
    /// # Errors
    /// Returns error if the file is unreadable, malformed, of another kind,
    /// or fails its hash check
    pub fn load_path<T: ArtifactContent>(&self, path: &Path) -> PipelineResult<Artifact<T>> {
        let artifact = Artifact::<T>::from_json(&self.read(path)?)?;
        debug!(
            "Loaded {} ({} records, {})",
            artifact.name(),
            artifact.record_count(),
            artifact.content_hash().short()
        );
        Ok(artifact)
    }

    /// Load and verify a named artifact
    ///
    /// # Errors
    /// See [`ArtifactStore::load_path`]
    pub fn load<T: ArtifactContent>(&self, name: &str) -> PipelineResult<Artifact<T>> {
        self.load_path(&self.path_for(name))
    }

    /// Load a dataset artifact
    ///
    /// # Errors
    /// See [`ArtifactStore::load_path`]
    pub fn load_dataset(&self, name: &str) -> PipelineResult<Artifact<Dataset>> {
        self.load(name)
    }

    /// Load a profile artifact
    ///
    /// # Errors
    /// See [`ArtifactStore::load_path`]
    pub fn load_profile(&self, name: &str) -> PipelineResult<Artifact<Profile>> {
        self.load(name)
    }

    /// Save the profile manifest
    ///
    /// # Errors
    /// Returns error if encoding or writing fails
    pub fn save_manifest(&self, manifest: &ProfileManifest) -> PipelineResult<PathBuf> {
        let path = self.root.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(manifest)
            .map_err(sizer_model::ArtifactError::from)?;
        self.write_atomic(&path, json.as_bytes())?;
        info!(
            "Saved manifest of {} profiles to {}",
            manifest.profiles.len(),
            path.display()
        );
        Ok(path)
    }

    /// Load the profile manifest
    ///
    /// # Errors
    /// Returns error if the manifest is missing or malformed
    pub fn load_manifest(&self) -> PipelineResult<ProfileManifest> {
        let path = self.root.join(MANIFEST_FILE);
        let manifest: ProfileManifest = serde_json::from_str(&self.read(&path)?)
            .map_err(sizer_model::ArtifactError::from)?;
        Ok(manifest)
    }

    /// Load every profile a manifest lists, checking counts and hashes
    ///
    /// # Errors
    /// Returns [`PipelineError::ManifestMismatch`] or an artifact hash
    /// mismatch if a profile changed since the manifest was written
    pub fn load_manifest_profiles(
        &self,
        manifest: &ProfileManifest,
    ) -> PipelineResult<Vec<Artifact<Profile>>> {
        manifest
            .profiles
            .iter()
            .map(|entry| {
                let artifact = self.load_profile(&entry.name)?;
                if artifact.record_count() != entry.record_count {
                    return Err(PipelineError::ManifestMismatch {
                        name: entry.name.clone(),
                        expected: entry.record_count,
                        actual: artifact.record_count(),
                    });
                }
                if *artifact.content_hash() != entry.content_hash {
                    return Err(sizer_model::ArtifactError::HashMismatch {
                        name: entry.name.clone(),
                        expected: entry.content_hash,
                        actual: *artifact.content_hash(),
                    }
                    .into());
                }
                Ok(artifact)
            })
            .collect()
    }

    /// Write the request audit copy
    ///
    /// # Errors
    /// Returns error if encoding or writing fails
    pub fn save_request(&self, request: &SizerRequest) -> PipelineResult<PathBuf> {
        let path = self.root.join(REQUEST_FILE);
        self.write_atomic(&path, request.to_json_pretty()?.as_bytes())?;
        info!("Saved sizing request to {}", path.display());
        Ok(path)
    }

    /// Names of stored artifacts, sorted
    ///
    /// # Errors
    /// Returns [`PipelineError::Io`] if the directory cannot be listed
    pub fn list(&self) -> PipelineResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| PipelineError::io(&self.root, e))?;
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stem = name.strip_suffix(".json")?;
                let reserved = name == MANIFEST_FILE || name == REQUEST_FILE;
                (!reserved).then(|| stem.to_string())
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sizer_model::{GroupingDimension, VmRecord};
    use tempfile::TempDir;

    fn dataset() -> Dataset {
        vec![
            VmRecord::builder("vm-1").cluster("A").build(),
            VmRecord::builder("vm-2").cluster("B").build(),
        ]
        .into()
    }

    #[test]
    fn dataset_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let artifact = Artifact::new("1_vmdata_rvtools", 1, dataset()).unwrap();

        let path = store.save(&artifact).unwrap();
        assert_eq!(path, dir.path().join("1_vmdata_rvtools.json"));
        assert!(store.contains("1_vmdata_rvtools"));

        let loaded = store.load_dataset("1_vmdata_rvtools").unwrap();
        assert_eq!(loaded, artifact);
    }

    #[test]
    fn fractional_storage_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let gib = 1024.0 * 1024.0 * 1024.0;
        let dataset: Dataset = [12_361_517_127.0_f64, 53_687_091_201.0, 7_516_192_769.0]
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                VmRecord::builder(format!("vm-{i}"))
                    .storage_gib(bytes * 3.0 / gib, bytes / gib)
                    .build()
            })
            .collect();
        let artifact = Artifact::new("1_vmdata_liveoptics", 1, dataset).unwrap();

        let path = store.save(&artifact).unwrap();
        let loaded: Artifact<Dataset> = store.load_path(&path).unwrap();
        assert_eq!(loaded.content(), artifact.content());
    }

    #[test]
    fn tampered_artifact_fails_verification() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let artifact = Artifact::new("1_vmdata_rvtools", 1, dataset()).unwrap();
        let path = store.save(&artifact).unwrap();

        let text = fs::read_to_string(&path).unwrap().replace("vm-2", "vm-9");
        fs::write(&path, text).unwrap();

        let err = store.load_dataset("1_vmdata_rvtools").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Artifact(sizer_model::ArtifactError::HashMismatch { .. })
        ));
    }

    #[test]
    fn loading_dataset_as_profile_fails() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store
            .save(&Artifact::new("1_vmdata_rvtools", 1, dataset()).unwrap())
            .unwrap();
        assert!(store.load_profile("1_vmdata_rvtools").is_err());
    }

    #[test]
    fn manifest_round_trips_and_lists() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let profile = Profile::grouped("5_cluster_A", GroupingDimension::Cluster, "A", dataset());
        let artifact = Artifact::new("5_cluster_A", 5, profile).unwrap();
        store.save(&artifact).unwrap();

        let manifest = ProfileManifest::new(
            "1_vmdata_rvtools",
            Some(PartitionStrategy::AllClusters),
            std::slice::from_ref(&artifact),
        );
        store.save_manifest(&manifest).unwrap();

        let loaded = store.load_manifest().unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.names(), vec!["5_cluster_A"]);
        assert_eq!(store.load_manifest_profiles(&loaded).unwrap(), vec![artifact]);
        assert_eq!(store.list().unwrap(), vec!["5_cluster_A"]);
    }

    #[test]
    fn missing_artifact_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_dataset("nope").unwrap_err(),
            PipelineError::Io { .. }
        ));
    }
}
