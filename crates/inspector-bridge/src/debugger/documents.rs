//! Script document table with a lazily built line index per document.

use indexmap::IndexMap;
use inspector_syntax::position::LineIndex;
use rustc_hash::FxHashMap;

use crate::error::{BridgeError, IdKind};
use crate::host::{DocumentId, HostScriptDocument, ScriptDebugHost};
use crate::protocol::Location;

#[derive(Debug, Default)]
pub(crate) struct DocumentTable {
    documents: IndexMap<DocumentId, HostScriptDocument>,
    by_url: FxHashMap<String, DocumentId>,
    lines: FxHashMap<DocumentId, LineIndex>,
}

impl DocumentTable {
    pub(crate) fn add(&mut self, document: HostScriptDocument) {
        self.by_url.insert(document.url.clone(), document.id);
        self.documents.insert(document.id, document);
    }

    pub(crate) fn remove(&mut self, id: DocumentId) -> Option<HostScriptDocument> {
        self.lines.remove(&id);
        let document = self.documents.shift_remove(&id)?;
        if self.by_url.get(&document.url) == Some(&id) {
            self.by_url.remove(&document.url);
        }
        Some(document)
    }

    /// Replace the metadata of a known document; its text may have changed.
    pub(crate) fn update(&mut self, document: HostScriptDocument) {
        self.remove(document.id);
        self.add(document);
    }

    pub(crate) fn clear(&mut self) {
        self.documents.clear();
        self.by_url.clear();
        self.lines.clear();
    }

    pub(crate) fn by_url(&self, url: &str) -> Option<DocumentId> {
        self.by_url.get(url).copied()
    }

    /// Resolve a protocol script id.
    pub(crate) fn parse_script_id(&self, script_id: &str) -> Result<DocumentId, BridgeError> {
        script_id
            .parse::<u64>()
            .ok()
            .map(DocumentId)
            .filter(|id| self.documents.contains_key(id))
            .ok_or_else(|| BridgeError::unknown_id(IdKind::Script, script_id))
    }

    /// Build the line index from text the caller already holds.
    pub(crate) fn prime(&mut self, id: DocumentId, text: &str) {
        self.lines.insert(id, LineIndex::new(text));
    }

    pub(crate) fn cached(&self, id: DocumentId) -> Option<&LineIndex> {
        self.lines.get(&id)
    }

    pub(crate) fn line_index(
        &mut self,
        host: &dyn ScriptDebugHost,
        id: DocumentId,
    ) -> Result<&LineIndex, BridgeError> {
        if !self.lines.contains_key(&id) {
            let text = host.source_text(id)?;
            self.lines.insert(id, LineIndex::new(&text));
        }
        self.lines
            .get(&id)
            .ok_or_else(|| BridgeError::invariant("line index missing after build"))
    }

    pub(crate) fn location(
        &mut self,
        host: &dyn ScriptDebugHost,
        id: DocumentId,
        offset: usize,
    ) -> Result<Location, BridgeError> {
        let (line, column) = self.line_index(host, id)?.offset_to_line_column(offset)?;
        Ok(Location {
            script_id: id.0.to_string(),
            line_number: line,
            column_number: Some(column),
        })
    }
}
