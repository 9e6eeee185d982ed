//! Concrete partitioners
//!
//! - [`ClusterPartitioner`]: exact cluster grouping, all or a listed subset
//! - [`TextMatchPartitioner`]: substring grouping on guest OS or VM name

mod cluster;
mod text_match;

pub use cluster::{ClusterPartitioner, CLUSTER_REMAINDER};
pub use text_match::{TextMatchPartitioner, OS_REMAINDER, VM_NAME_REMAINDER};

use std::collections::HashSet;
use tracing::warn;

/// Hands out profile names, suffixing collisions left by sanitization
#[derive(Debug, Default)]
pub(crate) struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    pub(crate) fn allocate(&mut self, name: String) -> String {
        if self.taken.insert(name.clone()) {
            return name;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{name}_{n}");
            if self.taken.insert(candidate.clone()) {
                warn!("Profile name {} already used, writing {}", name, candidate);
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collisions_get_suffixes() {
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate("5_cluster_a_b".into()), "5_cluster_a_b");
        assert_eq!(names.allocate("5_cluster_a_b".into()), "5_cluster_a_b_2");
        assert_eq!(names.allocate("5_cluster_a_b".into()), "5_cluster_a_b_3");
        assert_eq!(names.allocate("5_cluster_c".into()), "5_cluster_c");
    }
}
