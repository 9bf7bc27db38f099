//! Canonical ordering applied right before a document is written.
//!
//! - Versions: ascending by [`Version`] ordering, never by plain string order
//! - Instances: ascending by name, ordinal byte comparison
//! - Snapshots: untouched, in-memory order is the persisted order
//!
//! Both sorts are stable, so equal keys keep their relative order.

use crate::config::schema::Document;
use crate::version::{Version, VersionParseError};

pub struct PersistenceSorter;

impl PersistenceSorter {
    /// Sort `document` in place. On a bad version the document is left unchanged.
    pub fn canonicalize(document: &mut Document) -> Result<(), VersionParseError> {
        Self::sort_versions(&mut document.versions)?;
        document.instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(())
    }

    pub fn sort_versions(versions: &mut Vec<String>) -> Result<(), VersionParseError> {
        let mut keyed = versions
            .iter()
            .map(|raw| Version::parse(raw).map(|v| (v, raw.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        *versions = keyed.into_iter().map(|(_, raw)| raw).collect();
        Ok(())
    }
}
