//! Database software version ordering
//!
//! Release strings look like `2.6.0.0` or `2.6.0.0-b12`: any number of
//! dot-separated numeric components, optionally followed by a build suffix.

use std::cmp::Ordering;

/// Parsed form of a release string
#[derive(Debug, Clone)]
struct ReleaseVersion {
    components: Vec<u64>,
    build: Option<u64>,
}

impl ReleaseVersion {
    fn parse(raw: &str) -> Self {
        let (core, suffix) = match raw.split_once('-') {
            Some((core, suffix)) => (core, Some(suffix)),
            None => (raw, None),
        };
        let components = core
            .split('.')
            .map(|part| leading_number(part).unwrap_or(0))
            .collect();
        let build = suffix.and_then(|s| leading_number(s.trim_start_matches('b')));
        Self { components, build }
    }
}

fn leading_number(part: &str) -> Option<u64> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        self.build.unwrap_or(0).cmp(&other.build.unwrap_or(0))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two release strings
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    ReleaseVersion::parse(a).cmp(&ReleaseVersion::parse(b))
}

/// Sort release strings newest first
pub fn sort_versions_desc(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(b, a));
}

/// Newest release in the list
pub fn latest_version(versions: &[String]) -> Option<&String> {
    versions.iter().max_by(|a, b| compare_versions(a, b))
}
