use super::file::PerFileCounts;
use super::types::{AggregateKey, AggregateRecord, LogKind, SeverityTotals, TestIdentity};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Merges per-file counts into the deduplicated result set.
///
/// Owned by the coordinator thread only. Records keep the first occurrence
/// merged as their representative, so merge order decides representatives
/// but never counts.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: BTreeMap<AggregateKey, AggregateRecord>,
    totals: SeverityTotals,
    memory_warning_keys: Option<usize>,
    pressure_reported: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report memory pressure once the number of distinct keys exceeds `limit`
    pub fn with_memory_warning(mut self, limit: usize) -> Self {
        self.memory_warning_keys = (limit > 0).then_some(limit);
        self
    }

    /// Merge one file's counts. Returns the number of distinct keys when
    /// this merge pushed the aggregate over the memory warning threshold.
    pub fn merge(
        &mut self,
        counts: &PerFileCounts,
        identity: &TestIdentity,
        kind: LogKind,
    ) -> Option<usize> {
        for entry in &counts.entries {
            let key = AggregateKey {
                testcase: identity.testcase.clone(),
                testopt: identity.testopt.clone(),
                severity: entry.severity,
                message: entry.message.clone(),
                kind,
            };

            match self.records.entry(key) {
                Entry::Occupied(mut occupied) => occupied.get_mut().count += entry.count,
                Entry::Vacant(vacant) => {
                    let key = vacant.key().clone();
                    vacant.insert(AggregateRecord {
                        key,
                        count: entry.count,
                        orig_message: entry.orig_message.clone(),
                        file_path: counts.display_path.clone(),
                        line_number: entry.line_number,
                        id: identity.id.clone(),
                    });
                }
            }

            self.totals.add(entry.severity, entry.count);
        }

        match self.memory_warning_keys {
            Some(limit) if !self.pressure_reported && self.records.len() > limit => {
                self.pressure_reported = true;
                tracing::warn!(
                    "Aggregate holds {} distinct messages (warning threshold {})",
                    self.records.len(),
                    limit
                );
                Some(self.records.len())
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn totals(&self) -> SeverityTotals {
        self.totals
    }

    /// Consume the aggregator, yielding records sorted by key
    pub fn finish(self) -> (Vec<AggregateRecord>, SeverityTotals) {
        (self.records.into_values().collect(), self.totals)
    }
}
