use pretty_assertions::assert_eq;
use sizer_core::{
    Pipeline, PipelineConfig, PipelineError, MANIFEST_FILE, REQUEST_FILE, UNPARTITIONED_ARTIFACT,
};
use sizer_ingest::{MemoryWorkbook, SourceTool};
use sizer_model::ArtifactError;
use sizer_payload::{SizerRequest, StoragePolicy};
use sizer_test_utils::{
    liveoptics_workbook, rvtools_workbook, LiveOpticsRow, LiveOpticsUnits, RvToolsRow,
    RvToolsVersion,
};
use sizer_transform::{FilterField, PowerStateFilter};
use std::fs;
use tempfile::TempDir;

fn scenario_workbook() -> MemoryWorkbook {
    rvtools_workbook(
        "inventory.xlsx",
        RvToolsVersion::V4,
        &[
            RvToolsRow::new("vm-1", "vm-1")
                .cluster("A")
                .storage(102_400.0, 51_200.0),
            RvToolsRow::new("vm-2", "vm-2")
                .cluster("B")
                .power_state("poweredOff")
                .storage(0.0, 0.0),
        ],
    )
}

fn scenario_config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig::new(SourceTool::RvTools)
        .with_output_dir(dir.path())
        .with_power_state(PowerStateFilter::PoweredOn)
        .with_partition("all_clusters", None, false)
}

#[test]
fn test_scenario_end_to_end() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(scenario_config(&dir)).unwrap();
    let outcome = pipeline.run_workbooks(vec![scenario_workbook()]).unwrap();

    let stages: Vec<(&str, usize)> = outcome
        .stages
        .iter()
        .map(|s| (s.artifact.as_str(), s.records))
        .collect();
    assert_eq!(
        stages,
        vec![
            ("1_vmdata_rvtools", 2),
            ("2_vmdata_power_state", 1),
            ("5_cluster_A", 1),
        ]
    );
    assert_eq!(outcome.profiles, vec!["5_cluster_A"]);
    assert!(!outcome.has_warnings());

    let request = outcome.request.unwrap();
    let vm = &request.workload_profiles[0].vm_list[0];
    assert_eq!(vm.vm_id, "vm-1");
    assert_eq!(
        (vm.vm_storage_info.vmdk_total, vm.vm_storage_info.vmdk_used),
        (100, 100)
    );

    let audit = fs::read_to_string(dir.path().join(REQUEST_FILE)).unwrap();
    assert_eq!(SizerRequest::from_json(&audit).unwrap(), request);
    assert!(dir.path().join(MANIFEST_FILE).is_file());
    assert_eq!(
        pipeline.store().list().unwrap(),
        vec!["1_vmdata_rvtools", "2_vmdata_power_state", "5_cluster_A"]
    );
}

#[test]
fn test_utilized_policy_without_partition() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::new(SourceTool::RvTools)
        .with_output_dir(dir.path())
        .with_storage_policy(StoragePolicy::Utilized);
    let outcome = Pipeline::new(config)
        .unwrap()
        .run_workbooks(vec![scenario_workbook()])
        .unwrap();

    let request = outcome.request.unwrap();
    assert_eq!(request.workload_profiles.len(), 1);
    assert_eq!(request.workload_profiles[0].profile_name, "1_vmdata_rvtools");
    let totals: Vec<u64> = request.workload_profiles[0]
        .vm_list
        .iter()
        .map(|vm| vm.vm_storage_info.vmdk_used)
        .collect();
    assert_eq!(totals, vec![50, 10]);
    assert_eq!(outcome.stages.last().unwrap().artifact, UNPARTITIONED_ARTIFACT);
}

#[test]
fn test_empty_include_warns_and_continues() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::new(SourceTool::RvTools)
        .with_output_dir(dir.path())
        .with_include(FilterField::Cluster, vec!["prod".into()]);
    let outcome = Pipeline::new(config)
        .unwrap()
        .run_workbooks(vec![scenario_workbook()])
        .unwrap();

    let warned: Vec<&str> = outcome.warnings.iter().map(|w| w.artifact.as_str()).collect();
    assert_eq!(warned, vec!["3_vmdata_include", UNPARTITIONED_ARTIFACT]);
    let request = outcome.request.unwrap();
    assert!(request.workload_profiles[0].vm_list.is_empty());
}

#[test]
fn test_invalid_filter_rejected_before_reading() {
    let dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::new(SourceTool::RvTools)
        .with_output_dir(dir.path().join("out"))
        .with_inputs(vec![dir.path().join("does-not-exist.xlsx")]);
    config.exclude_field = Some(FilterField::Os);

    let err = Pipeline::new(config).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("exclude_values"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_run_without_inputs_fails() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::new(SourceTool::RvTools).with_output_dir(dir.path());
    let err = Pipeline::new(config).unwrap().run().unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_wrong_tool_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::new(SourceTool::LiveOptics).with_output_dir(dir.path());
    let pipeline = Pipeline::new(config).unwrap();
    let err = pipeline.run_workbooks(vec![scenario_workbook()]).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(_)));
    assert!(pipeline.store().list().unwrap().is_empty());
}

#[test]
fn test_resume_from_dataset_with_new_filters() {
    let dir = TempDir::new().unwrap();
    Pipeline::new(scenario_config(&dir))
        .unwrap()
        .run_workbooks(vec![scenario_workbook()])
        .unwrap();

    let config = PipelineConfig::new(SourceTool::RvTools)
        .with_output_dir(dir.path())
        .with_exclude(FilterField::Cluster, vec!["a".into()])
        .with_partition("some_clusters", Some(vec!["B".into()]), true);
    let pipeline = Pipeline::new(config).unwrap();
    let outcome = pipeline
        .run_from_dataset(&dir.path().join("1_vmdata_rvtools.json"))
        .unwrap();

    assert_eq!(outcome.stages[0].artifact, "1_vmdata_rvtools");
    assert_eq!(outcome.profiles, vec!["5_cluster_B", "5_cluster_remainder"]);
    let manifest = pipeline.store().load_manifest().unwrap();
    assert_eq!(manifest.source, "4_vmdata_exclude");
}

#[test]
fn test_payload_from_manifest_matches_run() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(scenario_config(&dir)).unwrap();
    let first = pipeline.run_workbooks(vec![scenario_workbook()]).unwrap();
    fs::remove_file(dir.path().join(REQUEST_FILE)).unwrap();

    let rebuilt = pipeline.payload_from_manifest().unwrap();
    assert_eq!(rebuilt.request, first.request);
    assert!(dir.path().join(REQUEST_FILE).is_file());
}

#[test]
fn test_resume_paths_accept_byte_unit_exports() {
    let dir = TempDir::new().unwrap();
    let workbook = liveoptics_workbook(
        "liveoptics.xlsx",
        LiveOpticsUnits::Bytes,
        &[
            LiveOpticsRow::new("vm-1", "web01").storage(35_372.946_2, 11_788.834_2),
            LiveOpticsRow::new("vm-2", "db01").storage(51_200.3, 17_066.767),
        ],
    );
    let config = PipelineConfig::new(SourceTool::LiveOptics)
        .with_output_dir(dir.path())
        .with_partition("all_clusters", None, false);
    let pipeline = Pipeline::new(config).unwrap();
    let first = pipeline.run_workbooks(vec![workbook]).unwrap();

    let rebuilt = pipeline.payload_from_manifest().unwrap();
    assert_eq!(rebuilt.request, first.request);

    let resumed = pipeline
        .run_from_dataset(&dir.path().join("1_vmdata_liveoptics.json"))
        .unwrap();
    assert_eq!(resumed.request, first.request);
}

#[test]
fn test_payload_from_tampered_profile_fails() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(scenario_config(&dir)).unwrap();
    pipeline.run_workbooks(vec![scenario_workbook()]).unwrap();

    let path = dir.path().join("5_cluster_A.json");
    let text = fs::read_to_string(&path).unwrap().replace("\"vm-1\"", "\"vm-7\"");
    fs::write(&path, text).unwrap();

    let err = pipeline.payload_from_manifest().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Artifact(ArtifactError::HashMismatch { .. })
    ));
}

#[test]
fn test_config_file_drives_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.yaml");
    fs::write(
        &path,
        format!(
            "tool: rvtools\noutput_dir: {}\npower_state: p\npartition: all_clusters\n",
            dir.path().join("out").display()
        ),
    )
    .unwrap();

    let config = PipelineConfig::from_file(&path).unwrap();
    let outcome = Pipeline::new(config)
        .unwrap()
        .run_workbooks(vec![scenario_workbook()])
        .unwrap();
    assert_eq!(outcome.profiles, vec!["5_cluster_A"]);
    assert!(dir.path().join("out").join(REQUEST_FILE).is_file());
}

#[test]
fn test_describe_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let config = PipelineConfig::new(SourceTool::RvTools).with_output_dir(&out);
    let summary = Pipeline::new(config)
        .unwrap()
        .describe_workbooks(vec![scenario_workbook()])
        .unwrap();

    assert_eq!(summary.total_vms, 2);
    assert_eq!(summary.clusters, vec!["A", "B"]);
    assert_eq!(summary.count(sizer_model::PowerState::PoweredOff), 1);
    assert!(!out.exists());
}
