//! Archive naming for downloaded versions.
//!
//! Releases from 9.5 onward ship as the platform distribution flavor; older
//! ones as the enterprise bundle. Only the release part decides, so
//! `9.5-SNAPSHOT` already uses the new name.

use std::cmp::Ordering;
use std::path::PathBuf;

use crate::environment::Environment;
use crate::version::{Version, VersionParseError};

/// First release distributed as the platform flavor.
pub const MIGRATION_VERSION: &str = "9.5";

const PLATFORM_PREFIX: &str = "xwiki-platform-distribution-flavor-jetty-hsqldb";
const ENTERPRISE_PREFIX: &str = "xwiki-enterprise-jetty-hsqldb";
const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

pub fn archive_base_name(version: &str) -> Result<String, VersionParseError> {
    let parsed = Version::parse(version)?;
    let migration = Version::parse(MIGRATION_VERSION)?;
    let prefix = match parsed.cmp_release(&migration) {
        Ordering::Less => ENTERPRISE_PREFIX,
        Ordering::Equal | Ordering::Greater => PLATFORM_PREFIX,
    };
    Ok(format!("{prefix}-{version}"))
}

pub fn archive_name(version: &str) -> Result<String, VersionParseError> {
    Ok(format!("{}.zip", archive_base_name(version)?))
}

/// Where the archive for `version` is stored in the data directory.
pub fn archive_path(env: &Environment, version: &str) -> Result<PathBuf, VersionParseError> {
    Ok(env.data_dir().join(archive_name(version)?))
}

/// Nightly builds are fetched from a different repository.
pub fn is_snapshot_build(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}
