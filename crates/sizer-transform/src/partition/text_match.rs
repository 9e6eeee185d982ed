//! Substring partitioning on guest OS or VM name
//!
//! Profiles use a case-sensitive `contains`, one per substring in the order
//! given, and may overlap. The remainder is every record matching none of the
//! substrings ignoring case, the same test the filter chain uses.

use super::NameAllocator;
use crate::error::ConfigurationError;
use crate::matcher::SubstringMatcher;
use crate::strategy::{profile_name, GroupingStrategy, Partition};
use sizer_model::{Dataset, GroupingDimension, Profile, VmRecord};
use tracing::{info, warn};

/// Remainder profile name for guest OS partitioning
pub const OS_REMAINDER: &str = "5_os_remainder";

/// Remainder profile name for VM name partitioning
pub const VM_NAME_REMAINDER: &str = "5_vm_name_remainder";

/// Groups records by substrings of one text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatchPartitioner<'a> {
    dimension: GroupingDimension,
    substrings: &'a [String],
    include_remainder: bool,
}

impl<'a> TextMatchPartitioner<'a> {
    /// Partition on `guest_os`
    #[inline]
    #[must_use]
    pub fn guest_os(substrings: &'a [String], include_remainder: bool) -> Self {
        Self {
            dimension: GroupingDimension::GuestOs,
            substrings,
            include_remainder,
        }
    }

    /// Partition on `name`
    #[inline]
    #[must_use]
    pub fn vm_name(substrings: &'a [String], include_remainder: bool) -> Self {
        Self {
            dimension: GroupingDimension::VmName,
            substrings,
            include_remainder,
        }
    }

    fn field<'r>(&self, record: &'r VmRecord) -> &'r str {
        match self.dimension {
            GroupingDimension::GuestOs => &record.guest_os,
            _ => &record.name,
        }
    }

    fn labels(&self) -> (&'static str, &'static str) {
        match self.dimension {
            GroupingDimension::GuestOs => ("guest_os", OS_REMAINDER),
            _ => ("vm_name", VM_NAME_REMAINDER),
        }
    }
}

impl GroupingStrategy for TextMatchPartitioner<'_> {
    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.substrings.is_empty() {
            return Err(ConfigurationError::EmptyList {
                parameter: "profile_list",
            });
        }
        Ok(())
    }

    fn partition(&self, dataset: &Dataset) -> Result<Partition, ConfigurationError> {
        self.validate()?;
        let (kind, remainder_name) = self.labels();
        let mut names = NameAllocator::default();

        let mut profiles = Vec::with_capacity(self.substrings.len());
        for substring in self.substrings {
            let members = dataset.select(|r| self.field(r).contains(substring.as_str()));
            if members.is_empty() {
                warn!("No VMs match {} '{}', profile is empty", kind, substring);
            }
            profiles.push(Profile::grouped(
                names.allocate(profile_name(kind, substring)),
                self.dimension,
                substring.as_str(),
                members,
            ));
        }

        let remainder = if self.include_remainder {
            let matcher = SubstringMatcher::new("profile_list", self.substrings)?;
            let rest = dataset.select(|r| !matcher.is_match(self.field(r)));
            Some(Profile::remainder(
                names.allocate(remainder_name.to_string()),
                self.dimension,
                rest,
            ))
        } else {
            None
        };

        info!(
            "Partitioned {} VMs into {} {} profiles{}",
            dataset.len(),
            profiles.len(),
            kind,
            if remainder.is_some() { " plus remainder" } else { "" }
        );
        Ok(Partition {
            profiles,
            remainder,
        })
    }

    fn name(&self) -> &'static str {
        self.labels().0
    }

    fn dimension(&self) -> GroupingDimension {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, os: &str) -> VmRecord {
        VmRecord::builder(id).name(name).guest_os(os).build()
    }

    fn dataset() -> Dataset {
        vec![
            record("1", "sql01", "Windows Server 2019"),
            record("2", "web01", "Ubuntu 22.04"),
            record("3", "SQL02", "windows 10"),
            record("4", "app01", "Red Hat 8"),
        ]
        .into()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn overlapping_profiles_in_caller_order() {
        let list = strings(&["2019", "Windows"]);
        let partition = TextMatchPartitioner::guest_os(&list, false)
            .partition(&dataset())
            .unwrap();
        let names: Vec<&str> = partition.profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["5_guest_os_2019", "5_guest_os_Windows"]);
        assert_eq!(partition.profiles[0].dataset.ids(), vec!["1"]);
        // case-sensitive: "windows 10" is not in the Windows profile
        assert_eq!(partition.profiles[1].dataset.ids(), vec!["1"]);
    }

    #[test]
    fn remainder_ignores_case() {
        let list = strings(&["Windows"]);
        let partition = TextMatchPartitioner::guest_os(&list, true)
            .partition(&dataset())
            .unwrap();
        let remainder = partition.remainder.unwrap();
        assert_eq!(remainder.name, OS_REMAINDER);
        // "windows 10" joins no profile and still matches for the remainder test
        assert_eq!(remainder.dataset.ids(), vec!["2", "4"]);
    }

    #[test]
    fn vm_name_profiles() {
        let list = strings(&["sql", "none-such"]);
        let partition = TextMatchPartitioner::vm_name(&list, true)
            .partition(&dataset())
            .unwrap();
        assert_eq!(partition.profiles[0].name, "5_vm_name_sql");
        assert_eq!(partition.profiles[0].dataset.ids(), vec!["1"]);
        assert!(partition.profiles[1].is_empty());
        let remainder = partition.remainder.unwrap();
        assert_eq!(remainder.name, VM_NAME_REMAINDER);
        assert_eq!(remainder.dataset.ids(), vec!["2", "4"]);
    }

    #[test]
    fn empty_list_rejected() {
        let list: Vec<String> = Vec::new();
        assert!(TextMatchPartitioner::vm_name(&list, false).validate().is_err());
    }
}
