//! Testing utilities for the VM sizer workspace
//!
//! Shared record fixtures and in-memory workbooks laid out like real
//! RVTools and LiveOptics exports.

#![allow(missing_docs)]

use sizer_ingest::{Cell, MemoryWorkbook, Table};
use sizer_model::{Dataset, PowerState, VmRecord};

pub fn vm(id: &str, cluster: &str, state: PowerState) -> VmRecord {
    VmRecord::builder(id)
        .name(id)
        .cluster(cluster)
        .power_state(state)
        .vcpu_count(2)
        .ram_gib(4.0)
        .storage_gib(100.0, 50.0)
        .build()
}

pub fn vm_with_os(id: &str, name: &str, os: &str) -> VmRecord {
    VmRecord::builder(id)
        .name(name)
        .guest_os(os)
        .power_state(PowerState::PoweredOn)
        .build()
}

/// vm-1 in A, on, 50 used / 100 provisioned; vm-2 in B, off, no storage
pub fn power_scenario() -> Dataset {
    vec![
        VmRecord::builder("vm-1")
            .name("vm-1")
            .cluster("A")
            .power_state(PowerState::PoweredOn)
            .vcpu_count(2)
            .ram_gib(8.0)
            .storage_gib(100.0, 50.0)
            .build(),
        VmRecord::builder("vm-2")
            .name("vm-2")
            .cluster("B")
            .power_state(PowerState::PoweredOff)
            .vcpu_count(1)
            .ram_gib(2.0)
            .storage_gib(0.0, 0.0)
            .build(),
    ]
    .into()
}

/// Three VMs in `prod-east`, `prod-west` and `dev`
pub fn cluster_scenario() -> Dataset {
    vec![
        vm("vm-1", "prod-east", PowerState::PoweredOn),
        vm("vm-2", "prod-west", PowerState::PoweredOn),
        vm("vm-3", "dev", PowerState::PoweredOn),
    ]
    .into()
}

/// One `vInfo` row
#[derive(Debug, Clone)]
pub struct RvToolsRow {
    pub id: Option<String>,
    pub name: String,
    pub power_state: String,
    pub cpus: f64,
    pub memory: f64,
    pub provisioned: f64,
    pub in_use: f64,
    pub cluster: Option<String>,
    pub os: Option<String>,
    pub ip: Option<String>,
}

impl RvToolsRow {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            power_state: "poweredOn".to_string(),
            cpus: 2.0,
            memory: 4096.0,
            provisioned: 102_400.0,
            in_use: 51_200.0,
            cluster: Some("A".to_string()),
            os: Some("Ubuntu Linux (64-bit)".to_string()),
            ip: None,
        }
    }

    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    pub fn storage(mut self, provisioned: f64, in_use: f64) -> Self {
        self.provisioned = provisioned;
        self.in_use = in_use;
        self
    }

    pub fn cluster(mut self, cluster: &str) -> Self {
        self.cluster = Some(cluster.to_string());
        self
    }

    pub fn power_state(mut self, state: &str) -> Self {
        self.power_state = state.to_string();
        self
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            text(self.id.as_deref()),
            Cell::from(self.name.as_str()),
            Cell::from(self.power_state.as_str()),
            Cell::from(self.cpus),
            Cell::from(self.memory),
            Cell::from(self.provisioned),
            Cell::from(self.in_use),
            text(self.cluster.as_deref()),
            Cell::from("DC1"),
            text(self.os.as_deref()),
            Cell::Empty,
            text(self.ip.as_deref()),
            Cell::from("Unmapped column"),
        ]
    }
}

fn text(value: Option<&str>) -> Cell {
    value.map_or(Cell::Empty, Cell::from)
}

/// Header label style of the RVTools storage columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RvToolsVersion {
    /// `Provisioned MiB` / `In Use MiB`
    V4,
    /// `Provisioned MB` / `In Use MB`
    V3,
}

pub fn rvtools_workbook(path: &str, version: RvToolsVersion, rows: &[RvToolsRow]) -> MemoryWorkbook {
    let (provisioned, in_use) = match version {
        RvToolsVersion::V4 => ("Provisioned MiB", "In Use MiB"),
        RvToolsVersion::V3 => ("Provisioned MB", "In Use MB"),
    };
    let headers = [
        "VM ID",
        "VM",
        "Powerstate",
        "CPUs",
        "Memory",
        provisioned,
        in_use,
        "Cluster",
        "Datacenter",
        "OS according to the VMware Tools",
        "DNS Name",
        "Primary IP Address",
        "Annotation",
    ];
    let table = Table::new(headers, rows.iter().map(RvToolsRow::cells).collect());
    MemoryWorkbook::new(path).with_sheet("vInfo", table)
}

/// Unit style of a LiveOptics export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveOpticsUnits {
    /// `(MB)` headers holding MiB
    Mb,
    /// `(Bytes)` headers
    Bytes,
}

impl LiveOpticsUnits {
    fn scale(self) -> f64 {
        match self {
            Self::Mb => 1.0,
            Self::Bytes => 1024.0 * 1024.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Mb => "MB",
            Self::Bytes => "Bytes",
        }
    }
}

/// One `VMs` row; sizes are given in MiB and scaled to the export's unit
#[derive(Debug, Clone)]
pub struct LiveOpticsRow {
    pub mob_id: String,
    pub name: String,
    pub power_state: String,
    pub vcpu: f64,
    pub memory_mib: f64,
    pub disk_size_mib: f64,
    pub disk_used_mib: f64,
    pub os: Option<String>,
    pub ips: [Option<String>; 4],
}

impl LiveOpticsRow {
    pub fn new(mob_id: &str, name: &str) -> Self {
        Self {
            mob_id: mob_id.to_string(),
            name: name.to_string(),
            power_state: "poweredOn".to_string(),
            vcpu: 4.0,
            memory_mib: 8192.0,
            disk_size_mib: 204_800.0,
            disk_used_mib: 102_400.0,
            os: Some("Microsoft Windows Server 2019 (64-bit)".to_string()),
            ips: [None, None, None, None],
        }
    }

    pub fn storage(mut self, size_mib: f64, used_mib: f64) -> Self {
        self.disk_size_mib = size_mib;
        self.disk_used_mib = used_mib;
        self
    }

    pub fn ips(mut self, ips: [Option<&str>; 4]) -> Self {
        self.ips = ips.map(|ip| ip.map(str::to_string));
        self
    }

    fn cells(&self, units: LiveOpticsUnits) -> Vec<Cell> {
        let scale = units.scale();
        let mut cells = vec![
            Cell::from(self.mob_id.as_str()),
            Cell::from(self.name.as_str()),
            Cell::from(self.power_state.as_str()),
            Cell::from(self.vcpu),
            Cell::from(self.memory_mib * scale),
            Cell::from(self.disk_size_mib * scale),
            Cell::from(self.disk_used_mib * scale),
            Cell::from("Cluster-1"),
            text(self.os.as_deref()),
        ];
        cells.extend(self.ips.iter().map(|ip| text(ip.as_deref())));
        cells
    }
}

pub fn liveoptics_workbook(path: &str, units: LiveOpticsUnits, rows: &[LiveOpticsRow]) -> MemoryWorkbook {
    let label = units.label();
    let memory = format!("Provisioned Memory ({label})");
    let size = format!("Virtual Disk Size ({label})");
    let used = format!("Virtual Disk Used ({label})");
    let headers = [
        "MOB ID",
        "VM Name",
        "Power State",
        "Virtual CPU",
        memory.as_str(),
        size.as_str(),
        used.as_str(),
        "Cluster",
        "VM OS",
        "Guest IP1",
        "Guest IP2",
        "Guest IP3",
        "Guest IP4",
    ];
    let table = Table::new(headers, rows.iter().map(|r| r.cells(units)).collect());
    MemoryWorkbook::new(path).with_sheet("VMs", table)
}

/// `VM Performance` sheet with one row per `(mob_id, avg read iops, avg write iops)`
pub fn performance_sheet(rows: &[(&str, f64, f64)]) -> Table {
    Table::new(
        [
            "MOB ID",
            "Avg Read IOPS",
            "Avg Write IOPS",
            "Avg Read MB/s",
            "Avg Write MB/s",
            "Peak Read IOPS",
            "Peak Write IOPS",
        ],
        rows.iter()
            .map(|(id, read, write)| {
                vec![
                    Cell::from(*id),
                    Cell::from(*read),
                    Cell::from(*write),
                    Cell::from(read / 10.0),
                    Cell::from(write / 10.0),
                    Cell::from(read * 2.0),
                    Cell::from(write * 2.0),
                ]
            })
            .collect(),
    )
}
