//! Process-wide table of the APIs this broker speaks.
//!
//! The table is the single source for version negotiation: the header
//! parser asks it whether a version is flexible, dispatch asks it whether a
//! version is supported, and the ApiVersions response advertises it verbatim.

use crate::constants::{
    API_KEY_API_VERSIONS, API_KEY_DESCRIBE_TOPIC_PARTITIONS, API_VERSIONS_FIRST_FLEXIBLE_VERSION,
    API_VERSIONS_MAX_VERSION, API_VERSIONS_MIN_VERSION, DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION,
    DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION,
};

/// Which response builder handles an API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    ApiVersions,
    DescribeTopicPartitions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiDescriptor {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
    pub first_flexible_version: i16,
    pub kind: ApiKind,
}

impl ApiDescriptor {
    pub fn supports(&self, api_version: i16) -> bool {
        (self.min_version..=self.max_version).contains(&api_version)
    }

    /// Flexible versions carry a tag buffer in the request header and use
    /// compact encodings in the body.
    pub fn is_flexible(&self, api_version: i16) -> bool {
        api_version >= self.first_flexible_version
    }
}

pub const SUPPORTED_APIS: &[ApiDescriptor] = &[
    ApiDescriptor {
        api_key: API_KEY_API_VERSIONS,
        min_version: API_VERSIONS_MIN_VERSION,
        max_version: API_VERSIONS_MAX_VERSION,
        first_flexible_version: API_VERSIONS_FIRST_FLEXIBLE_VERSION,
        kind: ApiKind::ApiVersions,
    },
    ApiDescriptor {
        api_key: API_KEY_DESCRIBE_TOPIC_PARTITIONS,
        min_version: DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION,
        max_version: DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION,
        first_flexible_version: 0,
        kind: ApiKind::DescribeTopicPartitions,
    },
];

pub fn lookup(api_key: i16) -> Option<&'static ApiDescriptor> {
    SUPPORTED_APIS.iter().find(|d| d.api_key == api_key)
}

/// Descriptor for `api_key`, only if `api_version` is in its range.
pub fn lookup_supported(api_key: i16, api_version: i16) -> Option<&'static ApiDescriptor> {
    lookup(api_key).filter(|d| d.supports(api_version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_versions_range_is_zero_to_four() {
        let descriptor = lookup(API_KEY_API_VERSIONS).unwrap();
        assert!(descriptor.supports(0));
        assert!(descriptor.supports(4));
        assert!(!descriptor.supports(5));
        assert!(!descriptor.supports(-1));
        assert!(!descriptor.is_flexible(2));
        assert!(descriptor.is_flexible(3));
    }

    #[test]
    fn describe_topic_partitions_only_v0() {
        assert!(lookup_supported(API_KEY_DESCRIBE_TOPIC_PARTITIONS, 0).is_some());
        assert!(lookup_supported(API_KEY_DESCRIBE_TOPIC_PARTITIONS, 1).is_none());
    }

    #[test]
    fn unknown_key_is_absent() {
        assert!(lookup(1).is_none());
        assert!(lookup_supported(1, 0).is_none());
    }

    #[test]
    fn api_keys_are_unique() {
        for (i, a) in SUPPORTED_APIS.iter().enumerate() {
            for b in &SUPPORTED_APIS[i + 1..] {
                assert_ne!(a.api_key, b.api_key);
            }
        }
    }
}
