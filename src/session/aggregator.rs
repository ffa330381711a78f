use crate::models::ScanRecord;
use std::collections::HashSet;

/// Ordered record list with optional payload dedup.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    records: Vec<ScanRecord>,
    seen: HashSet<(String, String)>,
    dedup: bool,
}

impl Aggregator {
    /// Empty aggregator
    pub fn new(dedup: bool) -> Self {
        Self {
            records: Vec::new(),
            seen: HashSet::new(),
            dedup,
        }
    }

    /// Whether duplicates are dropped
    pub fn dedup(&self) -> bool {
        self.dedup
    }

    /// Append records, skipping ones already present when dedup is on.
    ///
    /// Returns the records that were actually appended.
    pub fn add<I>(&mut self, records: I) -> &[ScanRecord]
    where
        I: IntoIterator<Item = ScanRecord>,
    {
        let start = self.records.len();
        for record in records {
            if self.dedup {
                let key = (record.data.clone(), record.code_type.clone());
                if !self.seen.insert(key) {
                    continue;
                }
            }
            self.records.push(record);
        }
        &self.records[start..]
    }

    /// Copy of everything collected so far, in insertion order.
    pub fn snapshot(&self) -> Vec<ScanRecord> {
        self.records.clone()
    }

    /// Borrow the collected records
    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forget every record
    pub fn clear(&mut self) {
        self.records.clear();
        self.seen.clear();
    }
}
