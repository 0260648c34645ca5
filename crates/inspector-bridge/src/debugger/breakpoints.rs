//! Breakpoint bookkeeping keyed by the host breakpoint id.

use indexmap::IndexMap;

use crate::host::{DocumentId, HostBreakpoint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRecord {
    pub id: u32,
    pub document: DocumentId,
    pub offset: usize,
    pub condition: Option<String>,
    pub is_tracepoint: bool,
    pub bound: bool,
}

#[derive(Debug, Default)]
pub(crate) struct BreakpointTable {
    records: IndexMap<u32, BreakpointRecord>,
}

impl BreakpointTable {
    pub(crate) fn insert(&mut self, record: BreakpointRecord) {
        self.records.insert(record.id, record);
    }

    pub(crate) fn remove(&mut self, id: u32) -> Option<BreakpointRecord> {
        self.records.shift_remove(&id)
    }

    pub(crate) fn get(&self, id: u32) -> Option<&BreakpointRecord> {
        self.records.get(&id)
    }

    /// Apply a host resolution; unknown ids are ignored.
    pub(crate) fn resolve(&mut self, resolved: &HostBreakpoint) -> Option<&BreakpointRecord> {
        let record = self.records.get_mut(&resolved.id)?;
        record.document = resolved.location.document;
        record.offset = resolved.location.offset;
        record.bound = resolved.bound;
        Some(record)
    }

    /// Mark every breakpoint in `document` unbound; returns their ids.
    pub(crate) fn unbind_document(&mut self, document: DocumentId) -> Vec<u32> {
        self.records
            .values_mut()
            .filter(|record| record.document == document && record.bound)
            .map(|record| {
                record.bound = false;
                record.id
            })
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
