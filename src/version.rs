//! Kube version parsing and patch-level comparison.
//!
//! MKS reports cluster versions as dotted `major.minor.patch` strings with
//! an optional leading `v`. Patch upgrades never cross a minor boundary, so
//! the helpers here reduce a version to exactly the parts the planner
//! compares.

use crate::error::MkuError;

/// Returns the given kube version trimmed to `major.minor`.
///
/// Both parts must be non-negative base-10 integers; the raw digits are
/// kept as written rather than re-formatted.
pub fn kube_version_to_minor(kube_version: &str) -> Result<String, MkuError> {
    let version = kube_version.strip_prefix('v').unwrap_or(kube_version);

    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() < 2 {
        return Err(MkuError::invalid_version(
            version,
            "expected to have major and minor version parts",
        ));
    }

    parse_part(version, parts[0], "major")?;
    parse_part(version, parts[1], "minor")?;

    Ok(format!("{}.{}", parts[0], parts[1]))
}

/// Returns the patch part of the given kube version.
pub fn kube_version_to_patch(kube_version: &str) -> Result<u32, MkuError> {
    let version = kube_version.strip_prefix('v').unwrap_or(kube_version);

    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() < 3 {
        return Err(MkuError::invalid_version(
            version,
            "expected to have major, minor and patch version parts",
        ));
    }

    parse_part(version, parts[2], "patch")
}

/// Compare two kube versions by patch part and return the later one.
/// Equal patches return `b`, which keeps a "latest seen" fold stable.
///
/// Minor parts are not inspected, so comparing versions from different
/// minors gives a meaningless answer; callers only feed this same-minor
/// pairs.
pub fn latest_by_patch<'a>(a: &'a str, b: &'a str) -> Result<&'a str, MkuError> {
    let a_patch = kube_version_to_patch(a)?;
    let b_patch = kube_version_to_patch(b)?;

    if a_patch > b_patch { Ok(a) } else { Ok(b) }
}

fn parse_part(version: &str, part: &str, name: &str) -> Result<u32, MkuError> {
    let value: i64 = part.parse().map_err(|_| {
        MkuError::invalid_version(version, format!("{name} part is not an integer number"))
    })?;
    if value < 0 {
        return Err(MkuError::invalid_version(
            version,
            format!("{name} part is a negative number"),
        ));
    }
    u32::try_from(value)
        .map_err(|_| MkuError::invalid_version(version, format!("{name} part is out of range")))
}
