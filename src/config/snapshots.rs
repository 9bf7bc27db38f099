//! In-memory snapshot entities.
//!
//! The registry is rebuilt from `Document::snapshots` on every load and reload,
//! so entities never outlive the document they came from. Callers holding a
//! [`Snapshot`] across a reload see the old state; look it up again by name.

use serde_json::Value;

use crate::config::schema::SnapshotRecord;

/// A saved instance state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    record: SnapshotRecord,
}

impl Snapshot {
    pub fn new(record: SnapshotRecord) -> Self {
        Self { record }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.record.field(key)
    }

    pub fn record(&self) -> &SnapshotRecord {
        &self.record
    }
}

/// Ordered collection of snapshot entities.
///
/// Duplicate names are tolerated on read; the first match wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotRegistry {
    entries: Vec<Snapshot>,
}

impl SnapshotRegistry {
    pub fn rebuild(records: &[SnapshotRecord]) -> Self {
        Self {
            entries: records.iter().cloned().map(Snapshot::new).collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Snapshot> {
        self.entries.iter().find(|s| s.name() == name)
    }

    /// Replace the first entity with the same name, or append.
    pub fn insert(&mut self, record: SnapshotRecord) {
        match self.entries.iter_mut().find(|s| s.name() == record.name) {
            Some(existing) => *existing = Snapshot::new(record),
            None => self.entries.push(Snapshot::new(record)),
        }
    }

    /// Remove every entity named `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.name() != name);
        self.entries.len() != before
    }

    /// Project back to persisted records, in current order.
    pub fn to_records(&self) -> Vec<SnapshotRecord> {
        self.entries.iter().map(|s| s.record().clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
