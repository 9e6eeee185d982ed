//! RVTools `vInfo` normalizer

use super::{common_fields, read_main_sheet, record_id, storage_value, Normalizer};
use crate::coerce;
use crate::error::IngestResult;
use crate::schema::{Field, SchemaRegistry, SourceTool};
use crate::workbook::Workbook;
use sizer_model::VmRecord;

/// Reads the `vInfo` sheet of an RVTools export
#[derive(Debug, Clone, Copy, Default)]
pub struct RvToolsNormalizer;

impl Normalizer for RvToolsNormalizer {
    fn tool(&self) -> SourceTool {
        SourceTool::RvTools
    }

    fn normalize(
        &self,
        registry: &SchemaRegistry,
        workbook: &mut dyn Workbook,
        first_index: usize,
    ) -> IngestResult<Vec<VmRecord>> {
        let main = read_main_sheet(registry, SourceTool::RvTools, workbook)?;
        let path = workbook.path().to_path_buf();
        let columns = &main.columns;

        let records = main
            .records()
            .enumerate()
            .map(|(offset, row)| {
                let id = record_id(columns, row, first_index + offset);
                let provisioned =
                    storage_value(columns, row, Field::ProvisionedStorage, &id, &path);
                let used = storage_value(columns, row, Field::UsedStorage, &id, &path);

                common_fields(columns, row, &id, &path)
                    .storage_gib(provisioned, used)
                    .folder(coerce::text(columns.cell(row, Field::Folder)))
                    .resource_pool(coerce::text(columns.cell(row, Field::ResourcePool)))
                    .build()
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{Cell, MemoryWorkbook, Table};
    use sizer_model::{PowerState, NO_CLUSTER, NO_GUEST_OS, NO_IP};

    const HEADERS: [&str; 14] = [
        "VM",
        "Powerstate",
        "CPUs",
        "Memory",
        "Provisioned MiB",
        "In Use MiB",
        "Cluster",
        "Datacenter",
        "OS according to the VMware Tools",
        "DNS Name",
        "Primary IP Address",
        "VM ID",
        "Folder",
        "Resource pool",
    ];

    fn row(values: [Cell; 14]) -> Vec<Cell> {
        values.to_vec()
    }

    fn workbook(rows: Vec<Vec<Cell>>) -> MemoryWorkbook {
        MemoryWorkbook::new("rvtools.xlsx").with_sheet("vInfo", Table::new(HEADERS, rows))
    }

    #[test]
    fn maps_and_converts_columns() {
        let mut wb = workbook(vec![row([
            "web01".into(),
            "poweredOn".into(),
            2.0.into(),
            4096.0.into(),
            102_400.0.into(),
            51_200.0.into(),
            "A".into(),
            "DC1".into(),
            "Ubuntu Linux (64-bit)".into(),
            "web01.local".into(),
            "10.0.0.5".into(),
            "vm-101".into(),
            "/prod".into(),
            "Resources".into(),
        ])]);

        let records = RvToolsNormalizer
            .normalize(&SchemaRegistry::with_defaults(), &mut wb, 0)
            .unwrap();
        let vm = &records[0];
        assert_eq!(vm.id, "vm-101");
        assert_eq!(vm.name, "web01");
        assert_eq!(vm.power_state, PowerState::PoweredOn);
        assert_eq!(vm.vcpu_count, 2);
        assert!((vm.ram_gib - 4.0).abs() < f64::EPSILON);
        assert!((vm.provisioned_storage_gib - 100.0).abs() < f64::EPSILON);
        assert!((vm.used_storage_gib - 50.0).abs() < f64::EPSILON);
        assert_eq!(vm.ip_addresses, "10.0.0.5");
        assert_eq!(vm.folder.as_deref(), Some("/prod"));
        assert_eq!(vm.resource_pool.as_deref(), Some("Resources"));
    }

    #[test]
    fn blanks_get_defaults_and_ids_are_generated() {
        let mut wb = workbook(vec![
            row([
                "web01".into(),
                "poweredOff".into(),
                "two".into(),
                Cell::Empty,
                0.0.into(),
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
            ]),
            vec![Cell::Empty; 14],
        ]);

        let records = RvToolsNormalizer
            .normalize(&SchemaRegistry::with_defaults(), &mut wb, 7)
            .unwrap();
        assert_eq!(records.len(), 1);
        let vm = &records[0];
        assert_eq!(vm.id, "generated-7");
        assert_eq!(vm.vcpu_count, 0);
        assert_eq!(vm.cluster, NO_CLUSTER);
        assert_eq!(vm.guest_os, NO_GUEST_OS);
        assert_eq!(vm.ip_addresses, NO_IP);
        assert!((vm.provisioned_storage_gib - 10.0).abs() < f64::EPSILON);
        assert!((vm.used_storage_gib - 10.0).abs() < f64::EPSILON);
        assert!(vm.folder.is_none());
    }
}
