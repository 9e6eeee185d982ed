use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sizer_ingest::{IngestError, Ingestor, MemoryWorkbook, SourceTool, PERFORMANCE_SHEET};
use sizer_model::PowerState;
use sizer_test_utils::{
    liveoptics_workbook, performance_sheet, rvtools_workbook, LiveOpticsRow, LiveOpticsUnits,
    RvToolsRow, RvToolsVersion,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

#[test]
fn test_multi_file_concatenation_and_duplicate_ids() {
    let first = rvtools_workbook(
        "a.xlsx",
        RvToolsVersion::V4,
        &[RvToolsRow::new("vm-1", "web01"), RvToolsRow::new("vm-2", "web02")],
    );
    let second = rvtools_workbook(
        "b.xlsx",
        RvToolsVersion::V3,
        &[
            RvToolsRow::new("vm-3", "db01"),
            RvToolsRow::new("vm-1", "web01-moved").cluster("B"),
        ],
    );

    let dataset = Ingestor::new(SourceTool::RvTools)
        .ingest(vec![first, second])
        .unwrap();

    assert_eq!(dataset.ids(), vec!["vm-1", "vm-2", "vm-3"]);
    let moved = &dataset.records()[0];
    assert_eq!(moved.name, "web01-moved");
    assert_eq!(moved.cluster, "B");
}

#[test]
fn test_generated_ids_follow_concatenated_position() {
    let first = rvtools_workbook(
        "a.xlsx",
        RvToolsVersion::V4,
        &[RvToolsRow::new("vm-1", "a"), RvToolsRow::new("x", "b").without_id()],
    );
    let second = rvtools_workbook(
        "b.xlsx",
        RvToolsVersion::V4,
        &[RvToolsRow::new("x", "c").without_id()],
    );

    let dataset = Ingestor::new(SourceTool::RvTools)
        .ingest(vec![first, second])
        .unwrap();
    assert_eq!(dataset.ids(), vec!["vm-1", "generated-1", "generated-2"]);
}

#[test]
fn test_wrong_tool_is_reported() {
    let workbook = rvtools_workbook("a.xlsx", RvToolsVersion::V4, &[RvToolsRow::new("vm-1", "a")]);
    let result = Ingestor::new(SourceTool::LiveOptics).ingest(vec![workbook]);
    assert!(matches!(result, Err(IngestError::Ingestion(_))));
}

#[test]
fn test_liveoptics_with_performance_and_ips() {
    let workbook = liveoptics_workbook(
        "lo.xlsx",
        LiveOpticsUnits::Mb,
        &[LiveOpticsRow::new("101", "sql01").ips([
            Some("10.0.0.1"),
            Some("no ip"),
            Some("10.0.0.1"),
            Some("10.0.0.2"),
        ])],
    )
    .with_sheet(PERFORMANCE_SHEET, performance_sheet(&[("101", 300.0, 150.0)]));

    let dataset = Ingestor::new(SourceTool::LiveOptics)
        .ingest(vec![workbook])
        .unwrap();
    let vm = &dataset.records()[0];
    assert_eq!(vm.ip_addresses, "10.0.0.1, 10.0.0.2");
    assert_eq!(vm.power_state, PowerState::PoweredOn);
    let perf = vm.storage_performance.unwrap();
    assert!(close(perf.avg_read_iops, 300.0));
    assert!(close(perf.avg_write_throughput, 15.0));
    assert_eq!(perf.peak_read_iops, Some(600.0));
    assert_eq!(perf.peak_read_throughput, None);
}

#[test]
fn test_missing_required_column_is_schema_mismatch() {
    use sizer_ingest::Table;
    let workbook = MemoryWorkbook::new("bad.xlsx").with_sheet(
        "vInfo",
        Table::new(["VM", "Provisioned MiB", "In Use MiB"], Vec::new()),
    );
    match Ingestor::new(SourceTool::RvTools).ingest(vec![workbook]) {
        Err(IngestError::Schema(mismatch)) => {
            assert_eq!(mismatch.missing, vec!["Powerstate", "CPUs", "Memory"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

proptest! {
    #[test]
    fn prop_rvtools_units_convert_to_gib(
        memory in 0.0f64..1e7,
        provisioned in 1.0f64..1e9,
        in_use in 1.0f64..1e9,
        v3 in any::<bool>(),
    ) {
        let version = if v3 { RvToolsVersion::V3 } else { RvToolsVersion::V4 };
        let mut row = RvToolsRow::new("vm-1", "a").storage(provisioned, in_use);
        row.memory = memory;
        let workbook = rvtools_workbook("a.xlsx", version, &[row]);

        let dataset = Ingestor::new(SourceTool::RvTools).ingest(vec![workbook]).unwrap();
        let vm = &dataset.records()[0];
        prop_assert!(close(vm.ram_gib, memory / 1024.0));
        prop_assert!(close(vm.provisioned_storage_gib, provisioned / 1024.0));
        prop_assert!(close(vm.used_storage_gib, in_use / 1024.0));
    }

    #[test]
    fn prop_liveoptics_units_convert_to_gib(
        size_mib in 1.0f64..1e7,
        used_mib in 1.0f64..1e7,
        bytes in any::<bool>(),
    ) {
        let units = if bytes { LiveOpticsUnits::Bytes } else { LiveOpticsUnits::Mb };
        let row = LiveOpticsRow::new("1", "a").storage(size_mib, used_mib);
        let workbook = liveoptics_workbook("lo.xlsx", units, &[row]);

        let dataset = Ingestor::new(SourceTool::LiveOptics).ingest(vec![workbook]).unwrap();
        let vm = &dataset.records()[0];
        prop_assert!(close(vm.provisioned_storage_gib, size_mib / 1024.0));
        prop_assert!(close(vm.used_storage_gib, used_mib / 1024.0));
        prop_assert!(close(vm.ram_gib, 8.0));
    }

    #[test]
    fn prop_record_count_is_conserved(
        rows in proptest::collection::vec(("[a-z]{1,8}", 0.0f64..64.0, "[a-zA-Z ]{0,10}"), 0..30)
    ) {
        let rows: Vec<RvToolsRow> = rows
            .iter()
            .enumerate()
            .map(|(i, (name, cpus, state))| {
                let mut row = RvToolsRow::new(&format!("vm-{i}"), name).power_state(state);
                row.cpus = *cpus;
                row
            })
            .collect();
        let workbook = rvtools_workbook("a.xlsx", RvToolsVersion::V4, &rows);

        let dataset = Ingestor::new(SourceTool::RvTools).ingest(vec![workbook]).unwrap();
        prop_assert_eq!(dataset.len(), rows.len());
    }
}
