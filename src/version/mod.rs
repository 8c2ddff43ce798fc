//! Semantic version parsing, ordering and canonical display for dependency versions.
//!
//! Terraform module tags and registry versions are written with a leading `v`
//! (`v3.2.0`) and are often abbreviated (`v1`, `v0.6`). This module accepts both
//! forms, fills in missing minor and patch components, and orders versions by
//! semantic-version precedence. Build metadata never affects ordering.
//!
//! # Validity
//!
//! - `v1.2.3`, `1.2.3`, `v1.2.3-rc.1+build.5` are valid
//! - `v1`, `v1.2` are valid shorthands for `v1.0.0` and `v1.2.0`
//! - Shorthands cannot carry prerelease or build metadata (`v1.2-rc` is invalid)
//! - Anything else (`main`, `release-2023`) is invalid
//!
//! Invalid versions sort below every valid version and compare equal to each other.

use semver::Version;
use std::cmp::Ordering;

/// Sentinel used as the latest version when no valid version is known.
pub const NO_VERSION: &str = "v0.0.0";

/// Parse a version string, accepting an optional `v`/`V` prefix and shorthands.
#[must_use]
pub fn parse_version(version: &str) -> Option<Version> {
    let cleaned = version.strip_prefix('v').or_else(|| version.strip_prefix('V')).unwrap_or(version);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(parsed) = Version::parse(cleaned) {
        return Some(parsed);
    }

    // Shorthand forms: MAJOR or MAJOR.MINOR, digits only
    let parts: Vec<&str> = cleaned.split('.').collect();
    if parts.len() > 2 || parts.iter().any(|p| !is_numeric_identifier(p)) {
        return None;
    }

    let major = parts[0].parse().ok()?;
    let minor = match parts.get(1) {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some(Version::new(major, minor, 0))
}

fn is_numeric_identifier(part: &str) -> bool {
    !part.is_empty()
        && part.chars().all(|c| c.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'))
}

/// Whether `version` is a valid semantic version (shorthands included).
#[must_use]
pub fn is_valid(version: &str) -> bool {
    parse_version(version).is_some()
}

/// Compare two version strings by semantic-version precedence.
///
/// Build metadata is ignored. An invalid version is less than any valid one,
/// and two invalid versions are equal.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => compare_precedence(&a, &b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn compare_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch).cmp(&(b.major, b.minor, b.patch)).then_with(|| a.pre.cmp(&b.pre))
}

/// Canonical display form: `vMAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
///
/// Invalid versions are returned unchanged so they still produce a usable
/// label. Canonicalizing a canonical string is a no-op.
#[must_use]
pub fn canonicalize(version: &str) -> String {
    let Some(parsed) = parse_version(version) else {
        return version.to_string();
    };

    let mut out = format!("v{}.{}.{}", parsed.major, parsed.minor, parsed.patch);
    if !parsed.pre.is_empty() {
        out.push('-');
        out.push_str(parsed.pre.as_str());
    }
    if !parsed.build.is_empty() {
        out.push('+');
        out.push_str(parsed.build.as_str());
    }
    out
}

/// Highest valid version of `versions`, or [`NO_VERSION`] if none exceeds it.
///
/// The winning entry is returned as written (`v3` stays `v3`).
#[must_use]
pub fn latest_version(versions: &[String]) -> String {
    let mut latest = NO_VERSION;
    for version in versions {
        if is_valid(version) && compare(version, latest) == Ordering::Greater {
            latest = version;
        }
    }
    latest.to_string()
}

/// Sort versions ascending by precedence. Equal versions keep their order.
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| compare(a, b));
}

/// Whether two version strings denote the same version.
#[must_use]
pub fn same_version(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_and_shorthand() {
        assert_eq!(parse_version("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version("v1"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_version("v0.6"), Some(Version::new(0, 6, 0)));
        assert_eq!(parse_version("v1.41"), Some(Version::new(1, 41, 0)));
    }

    #[test]
    fn test_invalid_versions() {
        assert!(!is_valid("main"));
        assert!(!is_valid("v"));
        assert!(!is_valid(""));
        assert!(!is_valid("v1.2-rc.1"));
        assert!(!is_valid("v01.2.3"));
        assert!(!is_valid("v1.2.3.4"));
        assert!(!is_valid("release-2023-01"));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare("v1.10.0", "v1.9.0"), Ordering::Greater);
        assert_eq!(compare("v1", "v1.0.0"), Ordering::Equal);
        assert_eq!(compare("v2.0.0-rc.1", "v2.0.0"), Ordering::Less);
        assert_eq!(compare("v1.0.0+build.1", "v1.0.0+build.2"), Ordering::Equal);
        assert_eq!(compare("garbage", "v0.0.1"), Ordering::Less);
        assert_eq!(compare("garbage", "nonsense"), Ordering::Equal);
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("v1"), "v1.0.0");
        assert_eq!(canonicalize("1.2"), "v1.2.0");
        assert_eq!(canonicalize("v1.2.3-rc.1"), "v1.2.3-rc.1");
        assert_eq!(canonicalize("v1.2.3+meta"), "v1.2.3+meta");
        assert_eq!(canonicalize("v1.2.3-beta+exp.sha.5114f85"), "v1.2.3-beta+exp.sha.5114f85");
        assert_eq!(canonicalize("main"), "main");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        for raw in ["v1", "v0.6", "1.2.3", "v2.0.0-alpha.1+b7", "v3.0.0+x", "not-a-version"] {
            let once = canonicalize(raw);
            assert_eq!(canonicalize(&once), once, "canonicalize not idempotent for {raw}");
        }
    }

    #[test]
    fn test_latest_version() {
        let versions: Vec<String> =
            ["v1.0.0", "v3.1.0", "v2.9.9", "junk", "v3.1.0-rc.1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(latest_version(&versions), "v3.1.0");
        assert_eq!(latest_version(&[]), NO_VERSION);
        assert_eq!(latest_version(&["junk".to_string()]), NO_VERSION);
        assert_eq!(latest_version(&["v3".to_string(), "v2".to_string()]), "v3");
    }

    #[test]
    fn test_sort_versions() {
        let mut versions: Vec<String> =
            ["v1.10.0", "v1.2.0", "v1.2.0-rc.1", "v0.9"].iter().map(|s| s.to_string()).collect();
        sort_versions(&mut versions);
        assert_eq!(versions, vec!["v0.9", "v1.2.0-rc.1", "v1.2.0", "v1.10.0"]);
    }

    #[test]
    fn test_same_version() {
        assert!(same_version("v1", "v1.0.0"));
        assert!(!same_version("v1", "v1.0.1"));
    }
}
