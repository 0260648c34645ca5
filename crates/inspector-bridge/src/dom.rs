//! DOM tree materialization and incremental disclosure.
//!
//! The client only learns about nodes the bridge has sent. `known` holds
//! every id a record was sent for; `disclosed` holds ids whose children were
//! sent. A node is disclosed only after all of its ancestors are, so
//! revealing a deep node (inspect element, backend id lookups) walks its
//! ancestry and discloses each level top-down.
//!
//! - get_document: populate the session from the root
//! - disclose_children: `DOM.setChildNodes` for one node
//! - ensure_ancestry_disclosed: reveal the path down to a node
//! - materialize: one node plus a bounded subtree

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::{BridgeError, IdKind};
use crate::host::{NodeHandle, NodeKind, PageHost};
use crate::protocol::{NodeRecord, Notification, SetChildNodesParams};
use crate::registry::{IdentityRegistry, ROOT_ID};

/// Frame id of the top-level document.
pub const MAIN_FRAME_ID: &str = "main";

/// Frame id announced for the document embedded by frame element `element_id`.
#[must_use]
pub fn frame_id_for(element_id: u32) -> String {
    format!("frame.{element_id}")
}

/// Told about each embedded document the first time it is materialized,
/// before the record mentioning it reaches the client.
pub trait DocumentObserver {
    fn document_discovered(
        &mut self,
        host: &dyn PageHost,
        document: NodeHandle,
        frame_id: &str,
        events: &mut Vec<Notification>,
    );
}

impl DocumentObserver for () {
    fn document_discovered(
        &mut self,
        _host: &dyn PageHost,
        _document: NodeHandle,
        _frame_id: &str,
        _events: &mut Vec<Notification>,
    ) {
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomState {
    Fresh,
    Populated,
}

/// Depth requested by the client: `-1` means the whole subtree.
#[must_use]
pub fn depth_from_protocol(depth: Option<i64>, default: usize) -> usize {
    match depth {
        None => default,
        Some(depth) if depth < 0 => usize::MAX,
        Some(depth) => usize::try_from(depth).unwrap_or(usize::MAX),
    }
}

struct Slot {
    record: Option<NodeRecord>,
    children: Vec<usize>,
    expanded: bool,
}

struct AncestorLink {
    handle: NodeHandle,
    /// The next link is this frame element's content document.
    crosses_frame: bool,
}

#[derive(Debug)]
pub struct DomAgent {
    nodes: IdentityRegistry<NodeHandle>,
    disclosed: FxHashSet<u32>,
    known: FxHashSet<u32>,
    /// Embedded documents announced so far.
    documents: Vec<(NodeHandle, String)>,
    state: DomState,
    default_depth: usize,
}

impl DomAgent {
    #[must_use]
    pub fn new(root: NodeHandle, default_depth: usize) -> Self {
        Self {
            nodes: IdentityRegistry::with_root(root),
            disclosed: FxHashSet::default(),
            known: FxHashSet::default(),
            documents: Vec::new(),
            state: DomState::Fresh,
            default_depth,
        }
    }

    #[must_use]
    pub fn state(&self) -> DomState {
        self.state
    }

    #[must_use]
    pub fn default_depth(&self) -> usize {
        self.default_depth
    }

    #[must_use]
    pub fn is_disclosed(&self, id: u32) -> bool {
        self.disclosed.contains(&id)
    }

    #[must_use]
    pub fn is_known(&self, id: u32) -> bool {
        self.known.contains(&id)
    }

    /// Id already minted for `handle`.
    #[must_use]
    pub fn id_of(&self, handle: NodeHandle) -> Option<u32> {
        self.nodes.get(handle)
    }

    /// Embedded documents materialized so far, with their frame ids.
    #[must_use]
    pub fn embedded_documents(&self) -> &[(NodeHandle, String)] {
        &self.documents
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.nodes.generation()
    }

    /// Forget the session after navigation; `root` is the new document.
    pub fn reset(&mut self, root: NodeHandle) {
        self.nodes.reset_with_root(root);
        self.disclosed.clear();
        self.known.clear();
        self.documents.clear();
        self.state = DomState::Fresh;
    }

    /// Host handle for a client node id.
    pub fn resolve(&self, host: &dyn PageHost, id: u32) -> Result<NodeHandle, BridgeError> {
        let handle = self
            .nodes
            .resolve(id)
            .map_err(|_| BridgeError::unknown_id(IdKind::Node, id))?;
        if !host.is_attached(handle) {
            return Err(BridgeError::stale(IdKind::Node, id));
        }
        Ok(handle)
    }

    /// Drop ids whose nodes the host no longer has attached; returns them.
    pub fn prune_detached(&mut self, host: &dyn PageHost) -> Vec<u32> {
        let dropped = self.nodes.retain_live(|handle| host.is_attached(handle));
        for id in &dropped {
            self.known.remove(id);
            self.disclosed.remove(id);
        }
        self.documents
            .retain(|(document, _)| host.is_attached(*document));
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "pruned detached nodes");
        }
        dropped
    }

    /// Id for `handle`, minting one if needed.
    pub fn id_for(&mut self, handle: NodeHandle) -> Result<u32, BridgeError> {
        self.nodes
            .id_for(Some(handle))
            .map_err(|_| BridgeError::InvalidReference)
    }

    pub fn get_document(
        &mut self,
        host: &dyn PageHost,
        depth: usize,
        observer: &mut dyn DocumentObserver,
        events: &mut Vec<Notification>,
    ) -> Result<NodeRecord, BridgeError> {
        let root = self.nodes.resolve(ROOT_ID).map_err(|_| {
            BridgeError::invariant("node registry has no root document")
        })?;
        let record = self.materialize(host, root, depth, observer, events)?;
        self.mark_sent(&record);
        if self.state == DomState::Fresh {
            debug!(generation = self.generation(), "document populated");
        }
        self.state = DomState::Populated;
        Ok(record)
    }

    /// Send the children of `id` down to `depth` levels.
    pub fn disclose_children(
        &mut self,
        host: &dyn PageHost,
        id: u32,
        depth: usize,
        observer: &mut dyn DocumentObserver,
        events: &mut Vec<Notification>,
    ) -> Result<(), BridgeError> {
        let handle = match self.resolve(host, id) {
            Ok(handle) => handle,
            Err(err @ BridgeError::StaleState { .. }) => {
                self.prune_detached(host);
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let children = self.visible_children(host, handle);
        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            match self.materialize(host, child, depth.saturating_sub(1), observer, events) {
                Ok(record) => nodes.push(record),
                Err(err) => warn!(%err, ?child, "skipping child that failed to materialize"),
            }
        }
        for record in &nodes {
            self.mark_sent(record);
        }
        self.disclosed.insert(id);
        self.known.insert(id);
        debug!(id, count = nodes.len(), "disclosed children");
        events.push(Notification::new(
            "DOM.setChildNodes",
            SetChildNodesParams {
                parent_id: id,
                nodes,
            },
        ));
        Ok(())
    }

    /// Disclose every ancestor of `target` the client has not expanded yet.
    ///
    /// Returns the ids disclosed by this call, root side first. An ancestry
    /// that cannot be walked yields an empty list.
    pub fn ensure_ancestry_disclosed(
        &mut self,
        host: &dyn PageHost,
        target: NodeHandle,
        observer: &mut dyn DocumentObserver,
        events: &mut Vec<Notification>,
    ) -> Vec<u32> {
        let Some(chain) = self.ancestor_chain(host, target) else {
            return Vec::new();
        };
        let start = chain
            .iter()
            .rposition(|link| {
                self.nodes
                    .get(link.handle)
                    .is_some_and(|id| self.disclosed.contains(&id))
            })
            .map_or(0, |index| index + 1);

        let mut disclosed = Vec::new();
        for link in &chain[start..] {
            let Ok(id) = self.id_for(link.handle) else {
                break;
            };
            if link.crosses_frame {
                // The content document travels in the frame element's own
                // record, so there are no children to send.
                self.disclosed.insert(id);
                self.known.insert(id);
                disclosed.push(id);
                continue;
            }
            match self.disclose_children(host, id, 1, observer, events) {
                Ok(()) => disclosed.push(id),
                Err(err) => {
                    warn!(%err, id, "ancestor disclosure stopped");
                    break;
                }
            }
        }
        disclosed
    }

    /// Client id for `target`, disclosing its ancestry first.
    pub fn push_node(
        &mut self,
        host: &dyn PageHost,
        target: NodeHandle,
        observer: &mut dyn DocumentObserver,
        events: &mut Vec<Notification>,
    ) -> Option<u32> {
        self.ensure_ancestry_disclosed(host, target, observer, events);
        let id = self.nodes.get(target)?;
        self.known.contains(&id).then_some(id)
    }

    /// Convert `node` and up to `depth` levels of descendants.
    pub fn materialize(
        &mut self,
        host: &dyn PageHost,
        node: NodeHandle,
        depth: usize,
        observer: &mut dyn DocumentObserver,
        events: &mut Vec<Notification>,
    ) -> Result<NodeRecord, BridgeError> {
        let mut visited = FxHashSet::default();
        visited.insert(node);
        let mut arena = vec![Slot {
            record: Some(self.convert(host, node, observer, events)?),
            children: Vec::new(),
            expanded: depth > 0,
        }];
        let mut worklist = vec![(0usize, node, depth)];

        while let Some((slot, handle, depth)) = worklist.pop() {
            if depth == 0 {
                continue;
            }
            for child in self.visible_children(host, handle) {
                if !visited.insert(child) {
                    warn!(?child, "cycle in host tree");
                    continue;
                }
                let record = match self.convert(host, child, observer, events) {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(%err, ?child, "skipping child that failed to convert");
                        continue;
                    }
                };
                let index = arena.len();
                arena.push(Slot {
                    record: Some(record),
                    children: Vec::new(),
                    expanded: depth > 1,
                });
                arena[slot].children.push(index);
                worklist.push((index, child, depth - 1));
            }
        }

        // Children always sit at higher indices than their parent.
        for index in (0..arena.len()).rev() {
            let children = std::mem::take(&mut arena[index].children);
            let records: Vec<NodeRecord> = children
                .into_iter()
                .filter_map(|child| arena[child].record.take())
                .collect();
            if arena[index].expanded {
                if let Some(record) = arena[index].record.as_mut() {
                    record.children = Some(records);
                }
            }
        }
        arena[0]
            .record
            .take()
            .ok_or_else(|| BridgeError::invariant("materialized tree lost its root"))
    }

    /// One node without children.
    fn convert(
        &mut self,
        host: &dyn PageHost,
        handle: NodeHandle,
        observer: &mut dyn DocumentObserver,
        events: &mut Vec<Notification>,
    ) -> Result<NodeRecord, BridgeError> {
        let info = host.node(handle)?;
        let id = self.id_for(handle)?;
        let mut record = NodeRecord {
            node_id: id,
            node_type: info.kind.code(),
            node_name: info.name.clone(),
            local_name: info.local_name.clone(),
            node_value: info.value.clone(),
            child_node_count: Some(self.visible_children(host, handle).len()),
            children: None,
            attributes: None,
            document_url: None,
            frame_id: None,
            content_document: None,
        };
        match info.kind {
            NodeKind::Element => {
                record.attributes = Some(
                    info.attributes
                        .iter()
                        .flat_map(|(name, value)| [name.clone(), value.clone()])
                        .collect(),
                );
            }
            NodeKind::Document => {
                record.document_url = info.document_url.clone();
                if id == ROOT_ID {
                    record.frame_id = Some(MAIN_FRAME_ID.to_string());
                }
            }
            _ => {}
        }
        if info.is_frame_element() {
            let frame_id = frame_id_for(id);
            if let Some(document) = self.embedded_document(host, handle, &frame_id, observer, events)
            {
                record.content_document = Some(Box::new(document));
            }
            record.frame_id = Some(frame_id);
        }
        Ok(record)
    }

    /// Depth-zero record of a frame element's content document.
    fn embedded_document(
        &mut self,
        host: &dyn PageHost,
        frame: NodeHandle,
        frame_id: &str,
        observer: &mut dyn DocumentObserver,
        events: &mut Vec<Notification>,
    ) -> Option<NodeRecord> {
        let document = match host.content_document(frame) {
            Ok(Some(document)) => document,
            Ok(None) => return None,
            Err(err) => {
                debug!(%err, ?frame, "frame content is not accessible");
                return None;
            }
        };
        let first_sight = !self.nodes.contains_handle(document);
        let info = match host.node(document) {
            Ok(info) => info,
            Err(err) => {
                warn!(%err, ?document, "embedded document vanished");
                return None;
            }
        };
        let id = self.id_for(document).ok()?;
        if first_sight {
            self.documents.push((document, frame_id.to_string()));
            observer.document_discovered(host, document, frame_id, events);
        }
        Some(NodeRecord {
            node_id: id,
            node_type: info.kind.code(),
            node_name: info.name,
            local_name: info.local_name,
            node_value: info.value,
            child_node_count: Some(self.visible_children(host, document).len()),
            children: None,
            attributes: None,
            document_url: info.document_url,
            frame_id: Some(frame_id.to_string()),
            content_document: None,
        })
    }

    /// Children minus whitespace-only text nodes.
    fn visible_children(&self, host: &dyn PageHost, handle: NodeHandle) -> Vec<NodeHandle> {
        let children = match host.children(handle) {
            Ok(children) => children,
            Err(err) => {
                warn!(%err, ?handle, "children unavailable");
                return Vec::new();
            }
        };
        children
            .into_iter()
            .filter(|child| {
                host.node(*child)
                    .map(|info| !info.is_whitespace_text())
                    .unwrap_or(false)
            })
            .collect()
    }

    fn mark_sent(&mut self, record: &NodeRecord) {
        let mut stack = vec![record];
        while let Some(record) = stack.pop() {
            self.known.insert(record.node_id);
            if let Some(children) = &record.children {
                self.disclosed.insert(record.node_id);
                stack.extend(children.iter());
            }
            if let Some(document) = &record.content_document {
                stack.push(document);
            }
        }
    }

    /// Root-to-parent chain of `target`, crossing frames.
    fn ancestor_chain(&self, host: &dyn PageHost, target: NodeHandle) -> Option<Vec<AncestorLink>> {
        let root = self.nodes.resolve(ROOT_ID).ok()?;
        let mut chain = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = target;
        loop {
            if !visited.insert(current) {
                warn!(?target, "cycle while walking ancestry");
                return None;
            }
            if let Some(parent) = host.parent(current) {
                chain.push(AncestorLink {
                    handle: parent,
                    crosses_frame: false,
                });
                current = parent;
                continue;
            }
            if current == root {
                break;
            }
            let frame = self.embedding_frame(host, root, current)?;
            chain.push(AncestorLink {
                handle: frame,
                crosses_frame: true,
            });
            current = frame;
        }
        chain.reverse();
        Some(chain)
    }

    /// Breadth-first search over frame elements for the one showing `document`.
    fn embedding_frame(
        &self,
        host: &dyn PageHost,
        root: NodeHandle,
        document: NodeHandle,
    ) -> Option<NodeHandle> {
        let mut queue = std::collections::VecDeque::from([root]);
        let mut seen = FxHashSet::default();
        seen.insert(root);
        while let Some(current) = queue.pop_front() {
            let Ok(frames) = host.frame_elements(current) else {
                continue;
            };
            for frame in frames {
                match host.content_document(frame) {
                    Ok(Some(content)) if content == document => return Some(frame),
                    Ok(Some(content)) => {
                        if seen.insert(content) {
                            queue.push_back(content);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => debug!(%err, ?frame, "skipping inaccessible frame"),
                }
            }
        }
        None
    }
}
