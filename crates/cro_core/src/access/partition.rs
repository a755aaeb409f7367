//! Private partition naming.

/// Suffix appended to an organization id to name its private partition.
pub const DEFAULT_PRIVATE_PARTITION_SUFFIX: &str = "PrivateCollection";

/// Derives the private partition name for `org_id`.
///
/// Total over any organization id; the same inputs always give the same name.
pub fn private_partition_name(org_id: &str, suffix: &str) -> String {
    format!("{org_id}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::{private_partition_name, DEFAULT_PRIVATE_PARTITION_SUFFIX};

    #[test]
    fn appends_suffix_to_org_id() {
        assert_eq!(
            private_partition_name("Org1MSP", DEFAULT_PRIVATE_PARTITION_SUFFIX),
            "Org1MSPPrivateCollection"
        );
    }

    #[test]
    fn distinct_orgs_get_distinct_partitions() {
        let org1 = private_partition_name("Org1MSP", DEFAULT_PRIVATE_PARTITION_SUFFIX);
        let org2 = private_partition_name("Org2MSP", DEFAULT_PRIVATE_PARTITION_SUFFIX);
        assert_ne!(org1, org2);
        assert_eq!(
            org1,
            private_partition_name("Org1MSP", DEFAULT_PRIVATE_PARTITION_SUFFIX)
        );
    }
}
