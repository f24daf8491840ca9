//! The authoritative node tree.
//!
//! [`TreeStore`] is the single owner of structure. Every node lives in one
//! id-keyed map; order lives in the root list and in each container's
//! `children`. Parent links are a cache the store rewrites on every
//! structural change and never accepts from callers.
//!
//! All mutations check every precondition before touching state, so a
//! failing call returns an error and leaves the tree unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;

use pagecraft_core::{
    Attributes, ContainerRef, IdError, LayoutAxis, NodeId, NodeIdAllocator, NodeKind,
};

use crate::error::{TreeError, TreeModelError};
use crate::node::NodeInstance;
use crate::registry::{ContainerKind, NodeRegistry};
use crate::snapshot::{InvariantReport, NodeRecord, TREE_SCHEMA_VERSION, TreeSnapshot};

/// Ordered tree of placed nodes plus the id allocator that feeds it.
#[derive(Debug, Clone)]
pub struct TreeStore {
    registry: Arc<NodeRegistry>,
    root: Vec<NodeId>,
    nodes: BTreeMap<NodeId, NodeInstance>,
    ids: NodeIdAllocator,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new(Arc::new(NodeRegistry::standard()))
    }
}

impl PartialEq for TreeStore {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.nodes == other.nodes && self.ids == other.ids
    }
}

impl TreeStore {
    /// Empty tree governed by `registry`.
    #[must_use]
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            root: Vec::new(),
            nodes: BTreeMap::new(),
            ids: NodeIdAllocator::default(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Shared handle to the registry, for building sibling stores.
    #[must_use]
    pub fn registry_handle(&self) -> Arc<NodeRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    #[must_use]
    pub fn root_children(&self) -> &[NodeId] {
        &self.root
    }

    /// Ordered children of a container, or `None` if the id is unknown.
    #[must_use]
    pub fn children(&self, container: ContainerRef) -> Option<&[NodeId]> {
        match container {
            ContainerRef::Root => Some(&self.root),
            ContainerRef::Node(id) => self.nodes.get(&id).map(NodeInstance::children),
        }
    }

    /// Kind of a container reference, or `None` if the id is unknown.
    #[must_use]
    pub fn kind_of(&self, container: ContainerRef) -> Option<ContainerKind> {
        match container {
            ContainerRef::Root => Some(ContainerKind::Root),
            ContainerRef::Node(id) => self
                .nodes
                .get(&id)
                .map(|node| ContainerKind::Kind(node.kind)),
        }
    }

    /// Stacking axis of a container; the canvas root stacks vertically.
    #[must_use]
    pub fn axis_of(&self, container: ContainerRef) -> Option<LayoutAxis> {
        match container {
            ContainerRef::Root => Some(LayoutAxis::Vertical),
            ContainerRef::Node(id) => self
                .nodes
                .get(&id)
                .and_then(|node| self.registry.axis(node.kind)),
        }
    }

    /// Whether a node is a container according to the registry.
    #[must_use]
    pub fn is_container(&self, id: NodeId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| self.registry.is_container(node.kind))
    }

    /// Current `(container, index)` of a node.
    #[must_use]
    pub fn position_of(&self, id: NodeId) -> Option<(ContainerRef, usize)> {
        let node = self.nodes.get(&id)?;
        let siblings = self.children(node.parent)?;
        let index = siblings.iter().position(|sibling| *sibling == id)?;
        Some((node.parent, index))
    }

    /// Whether `ancestor` is a strict ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut cursor = self.nodes.get(&descendant).map(NodeInstance::parent);
        while let Some(ContainerRef::Node(parent)) = cursor {
            if parent == ancestor {
                return true;
            }
            cursor = self.nodes.get(&parent).map(NodeInstance::parent);
        }
        false
    }

    /// All descendants of `id` in pre-order, excluding `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.nodes.get(&id) else {
            return out;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(child) = self.nodes.get(&next) {
                stack.extend(child.children.iter().rev().copied());
            }
        }
        out
    }

    /// Next id the allocator will hand out.
    #[must_use]
    pub fn peek_next_id(&self) -> NodeId {
        self.ids.peek()
    }

    /// Reserve a fresh node id.
    pub fn allocate_id(&mut self) -> Result<NodeId, TreeError> {
        self.ids.allocate().map_err(id_error)
    }

    /// Allocate an id and construct a detached node of `kind`.
    ///
    /// The id is only consumed when construction succeeds.
    pub fn create_node(&mut self, kind: NodeKind) -> Result<NodeInstance, TreeError> {
        let id = self.ids.peek();
        let node = self.registry.construct(kind, id)?;
        let _ = self.allocate_id()?;
        Ok(node)
    }

    /// Construct a node of `kind` and insert it at `index` in `target`.
    ///
    /// No id is consumed when the insert is rejected.
    pub fn add_new_node(
        &mut self,
        kind: NodeKind,
        target: ContainerRef,
        index: usize,
    ) -> Result<NodeId, TreeError> {
        let node = self.registry.construct(kind, self.ids.peek())?;
        let id = node.id;
        self.add_node(target, index, node)?;
        Ok(id)
    }

    /// Insert a detached node at `index` in `target`.
    pub fn add_node(
        &mut self,
        target: ContainerRef,
        index: usize,
        mut node: NodeInstance,
    ) -> Result<(), TreeError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId { node: id });
        }
        if !node.children.is_empty() {
            return Err(TreeError::NotDetached { node: id });
        }
        if !self.registry.contains(node.kind) {
            return Err(TreeError::UnknownKind { kind: node.kind });
        }
        self.check_accepts(target, node.kind)?;
        let len = self.child_count(target)?;
        if index > len {
            return Err(TreeError::InvalidIndex {
                container: target,
                index,
                len,
            });
        }

        let mut ids = self.ids.clone();
        ids.observe(id).map_err(id_error)?;

        self.ids = ids;
        node.parent = target;
        let kind = node.kind;
        let _ = self.nodes.insert(id, node);
        if let Some(list) = self.child_list_mut(target) {
            list.insert(index, id);
        }

        tracing::debug!(
            message = "tree.add",
            node = id.get(),
            kind = kind.as_str(),
            container = %target,
            index,
        );
        Ok(())
    }

    /// Insert a detached node at the end of `target`.
    pub fn append_node(
        &mut self,
        target: ContainerRef,
        node: NodeInstance,
    ) -> Result<(), TreeError> {
        let index = self.child_count(target)?;
        self.add_node(target, index, node)
    }

    /// Detach `id` and delete it with all of its descendants.
    ///
    /// Returns the removed ids, `id` first, then descendants in pre-order.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let Some((container, index)) = self.position_of(id) else {
            return Err(TreeError::NotFound { node: id });
        };

        if let Some(list) = self.child_list_mut(container) {
            let _ = list.remove(index);
        }
        let mut removed = Vec::with_capacity(1);
        removed.push(id);
        removed.extend(self.descendants(id));
        for node_id in &removed {
            let _ = self.nodes.remove(node_id);
        }

        tracing::debug!(
            message = "tree.remove",
            node = id.get(),
            container = %container,
            index,
            removed = removed.len(),
        );
        Ok(removed)
    }

    /// Move `id` to `index` in `target` as one all-or-nothing step.
    ///
    /// `index` addresses the target list after `id` has been taken out of
    /// its current place.
    pub fn move_node(
        &mut self,
        id: NodeId,
        target: ContainerRef,
        index: usize,
    ) -> Result<(), TreeError> {
        let Some(kind) = self.nodes.get(&id).map(NodeInstance::kind) else {
            return Err(TreeError::NotFound { node: id });
        };
        self.check_accepts(target, kind)?;
        if let ContainerRef::Node(target_id) = target
            && (target_id == id || self.is_ancestor(id, target_id))
        {
            return Err(TreeError::CycleDetected {
                node: id,
                target: target_id,
            });
        }
        let Some((source, source_index)) = self.position_of(id) else {
            return Err(TreeError::NotFound { node: id });
        };
        let len = self.child_count(target)?;
        let post_removal_len = if source == target { len - 1 } else { len };
        if index > post_removal_len {
            return Err(TreeError::InvalidIndex {
                container: target,
                index,
                len: post_removal_len,
            });
        }

        if let Some(list) = self.child_list_mut(source) {
            let _ = list.remove(source_index);
        }
        if let Some(list) = self.child_list_mut(target) {
            list.insert(index, id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = target;
        }

        tracing::debug!(
            message = "tree.move",
            node = id.get(),
            from = %source,
            from_index = source_index,
            container = %target,
            index,
        );
        Ok(())
    }

    /// Shallow-merge `patch` into a node's attributes.
    ///
    /// Returns the keys whose value changed.
    pub fn update_attributes(
        &mut self,
        id: NodeId,
        patch: Attributes,
    ) -> Result<Vec<String>, TreeError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(TreeError::NotFound { node: id })?;
        let changed = node.attributes.merge(patch);
        tracing::debug!(
            message = "tree.update_attributes",
            node = id.get(),
            changed = changed.len(),
        );
        Ok(changed)
    }

    /// Owned, canonical snapshot of the current tree.
    #[must_use]
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            schema_version: TREE_SCHEMA_VERSION,
            next_id: self.ids.peek(),
            root: self.root.clone(),
            nodes: self
                .nodes
                .values()
                .map(|node| NodeRecord {
                    id: node.id,
                    kind: node.kind,
                    parent: node.parent,
                    children: node.children.clone(),
                    attributes: node.attributes.clone(),
                })
                .collect(),
        }
    }

    /// Bulk-load a stored tree, rejecting any snapshot that breaks the
    /// tree invariants or the registry's nesting rules.
    pub fn from_snapshot(
        registry: Arc<NodeRegistry>,
        mut snapshot: TreeSnapshot,
    ) -> Result<Self, TreeModelError> {
        snapshot.canonicalize();
        snapshot.validate(&registry)?;

        let hash = snapshot.state_hash();
        let nodes: BTreeMap<NodeId, NodeInstance> = snapshot
            .nodes
            .into_iter()
            .map(|record| {
                (
                    record.id,
                    NodeInstance {
                        id: record.id,
                        kind: record.kind,
                        attributes: record.attributes,
                        children: record.children,
                        parent: record.parent,
                    },
                )
            })
            .collect();

        tracing::debug!(
            message = "tree.load",
            nodes = nodes.len(),
            next_id = snapshot.next_id.get(),
            hash,
        );
        Ok(Self {
            registry,
            root: snapshot.root,
            nodes,
            ids: NodeIdAllocator::with_next(snapshot.next_id),
        })
    }

    /// Validate the live tree, reporting the first violation.
    pub fn validate(&self) -> Result<(), TreeModelError> {
        self.snapshot().validate(&self.registry)
    }

    /// Structured invariant diagnostics for the current tree.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        self.snapshot().invariant_report(&self.registry)
    }

    /// Deterministic hash of structure and attributes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.snapshot().state_hash()
    }

    fn child_count(&self, container: ContainerRef) -> Result<usize, TreeError> {
        match container {
            ContainerRef::Root => Ok(self.root.len()),
            ContainerRef::Node(id) => self
                .nodes
                .get(&id)
                .map(|node| node.children.len())
                .ok_or(TreeError::NotFound { node: id }),
        }
    }

    fn check_accepts(&self, target: ContainerRef, child: NodeKind) -> Result<(), TreeError> {
        let container_kind = match target {
            ContainerRef::Root => ContainerKind::Root,
            ContainerRef::Node(id) => {
                let node = self.nodes.get(&id).ok_or(TreeError::NotFound { node: id })?;
                ContainerKind::Kind(node.kind)
            }
        };
        if self.registry.can_accept(container_kind, child) {
            return Ok(());
        }
        tracing::trace!(
            message = "tree.kind_rejected",
            container = %target,
            kind = child.as_str(),
        );
        Err(TreeError::KindRejected {
            container: target,
            container_kind: match container_kind {
                ContainerKind::Root => None,
                ContainerKind::Kind(kind) => Some(kind),
            },
            child,
        })
    }

    fn child_list_mut(&mut self, container: ContainerRef) -> Option<&mut Vec<NodeId>> {
        match container {
            ContainerRef::Root => Some(&mut self.root),
            ContainerRef::Node(id) => self.nodes.get_mut(&id).map(|node| &mut node.children),
        }
    }
}

fn id_error(err: IdError) -> TreeError {
    match err {
        IdError::Overflow { current } => TreeError::IdOverflow { current },
        IdError::ZeroId => TreeError::IdOverflow {
            current: NodeId::MIN,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).expect("test ID must be non-zero")
    }

    fn add(tree: &mut TreeStore, kind: NodeKind, target: ContainerRef, index: usize) -> NodeId {
        let node = tree.create_node(kind).expect("kind is registered");
        let node_id = node.id();
        tree.add_node(target, index, node).expect("add should succeed");
        node_id
    }

    /// Row with two columns; the first column holds two text fields.
    fn sample() -> (TreeStore, [NodeId; 5]) {
        let mut tree = TreeStore::default();
        let row = add(&mut tree, NodeKind::Row, ContainerRef::Root, 0);
        let c1 = add(&mut tree, NodeKind::Column, row.into(), 0);
        let c2 = add(&mut tree, NodeKind::Column, row.into(), 1);
        let t1 = add(&mut tree, NodeKind::TextField, c1.into(), 0);
        let t2 = add(&mut tree, NodeKind::SelectField, c1.into(), 1);
        (tree, [row, c1, c2, t1, t2])
    }

    #[test]
    fn add_sets_parent_and_order() {
        let (tree, [row, c1, c2, t1, t2]) = sample();
        assert_eq!(tree.root_children(), &[row]);
        assert_eq!(tree.children(row.into()), Some(&[c1, c2][..]));
        assert_eq!(tree.children(c1.into()), Some(&[t1, t2][..]));
        assert_eq!(tree.node(t2).map(NodeInstance::parent), Some(c1.into()));
        assert_eq!(tree.position_of(t2), Some((c1.into(), 1)));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn add_rejects_out_of_range_index() {
        let (mut tree, [_, c1, ..]) = sample();
        let before = tree.state_hash();
        let node = tree.create_node(NodeKind::TextField).expect("construct");
        assert_eq!(
            tree.add_node(c1.into(), 3, node),
            Err(TreeError::InvalidIndex {
                container: c1.into(),
                index: 3,
                len: 2,
            })
        );
        assert_eq!(tree.state_hash(), before);
    }

    #[test]
    fn add_rejects_kind_and_duplicates() {
        let (mut tree, [row, _, _, t1, _]) = sample();
        let field = tree.create_node(NodeKind::TextField).expect("construct");
        assert_eq!(
            tree.add_node(row.into(), 0, field),
            Err(TreeError::KindRejected {
                container: row.into(),
                container_kind: Some(NodeKind::Row),
                child: NodeKind::TextField,
            })
        );

        let clash = tree
            .registry()
            .construct(NodeKind::TextField, t1)
            .expect("construct");
        assert_eq!(
            tree.add_node(ContainerRef::Root, 0, clash),
            Err(TreeError::DuplicateId { node: t1 })
        );

        let into_leaf = tree.create_node(NodeKind::TextField).expect("construct");
        assert!(matches!(
            tree.add_node(t1.into(), 0, into_leaf),
            Err(TreeError::KindRejected { .. })
        ));
    }

    #[test]
    fn externally_chosen_ids_advance_allocator() {
        let mut tree = TreeStore::default();
        let node = tree
            .registry()
            .construct(NodeKind::TextField, id(40))
            .expect("construct");
        tree.add_node(ContainerRef::Root, 0, node).expect("add");
        assert_eq!(tree.allocate_id(), Ok(id(41)));
    }

    #[test]
    fn remove_cascades_to_descendants() {
        let (mut tree, [row, c1, c2, t1, t2]) = sample();
        let removed = tree.remove_node(row).expect("remove row");
        assert_eq!(removed, vec![row, c1, t1, t2, c2]);
        assert!(tree.is_empty());
        assert!(tree.root_children().is_empty());
        assert_eq!(
            tree.remove_node(row),
            Err(TreeError::NotFound { node: row })
        );
    }

    #[test]
    fn remove_detaches_from_parent_only() {
        let (mut tree, [_, c1, _, t1, t2]) = sample();
        assert_eq!(tree.remove_node(t1), Ok(vec![t1]));
        assert_eq!(tree.children(c1.into()), Some(&[t2][..]));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn move_within_same_container_uses_post_removal_index() {
        let (mut tree, [_, c1, _, t1, t2]) = sample();
        tree.move_node(t1, c1.into(), 1).expect("move to end");
        assert_eq!(tree.children(c1.into()), Some(&[t2, t1][..]));
        assert_eq!(
            tree.move_node(t1, c1.into(), 2),
            Err(TreeError::InvalidIndex {
                container: c1.into(),
                index: 2,
                len: 1,
            })
        );
    }

    #[test]
    fn move_across_containers_updates_parent() {
        let (mut tree, [_, c1, c2, t1, t2]) = sample();
        tree.move_node(t2, c2.into(), 0).expect("move");
        assert_eq!(tree.children(c1.into()), Some(&[t1][..]));
        assert_eq!(tree.children(c2.into()), Some(&[t2][..]));
        assert_eq!(tree.node(t2).map(NodeInstance::parent), Some(c2.into()));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn move_into_own_descendant_is_a_cycle() {
        let mut tree = TreeStore::default();
        let outer = add(&mut tree, NodeKind::Container, ContainerRef::Root, 0);
        let inner = add(&mut tree, NodeKind::Container, outer.into(), 0);
        let before = tree.clone();

        assert_eq!(
            tree.move_node(outer, inner.into(), 0),
            Err(TreeError::CycleDetected {
                node: outer,
                target: inner,
            })
        );
        assert_eq!(
            tree.move_node(outer, outer.into(), 0),
            Err(TreeError::CycleDetected {
                node: outer,
                target: outer,
            })
        );
        assert_eq!(tree, before);
        assert!(tree.is_ancestor(outer, inner));
        assert!(!tree.is_ancestor(inner, outer));
    }

    #[test]
    fn nesting_is_checked_before_cycles() {
        let (mut tree, [row, c1, ..]) = sample();
        assert!(matches!(
            tree.move_node(row, c1.into(), 0),
            Err(TreeError::KindRejected { .. })
        ));
    }

    #[test]
    fn update_attributes_merges_shallowly() {
        let (mut tree, [_, _, _, t1, t2]) = sample();
        let changed = tree
            .update_attributes(
                t1,
                Attributes::new()
                    .with("label", "Email")
                    .with("required", false),
            )
            .expect("update");
        assert_eq!(changed, vec!["label".to_string()]);

        let node = tree.node(t1).expect("t1");
        assert_eq!(node.label(), Some("Email"));
        assert_eq!(node.attributes().get("placeholder"), Some(&json!("Value here...")));
        assert_eq!(tree.node(t2).and_then(NodeInstance::label), Some("Text field"));
    }

    #[test]
    fn snapshot_round_trip_preserves_state() {
        let (tree, [.., t2]) = sample();
        let snapshot = tree.snapshot();
        let mut reloaded =
            TreeStore::from_snapshot(tree.registry_handle(), snapshot.clone()).expect("load");
        assert_eq!(reloaded, tree);
        assert_eq!(reloaded.snapshot(), snapshot);
        assert!(reloaded.allocate_id().expect("allocate") > t2);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (tree, [row, c1, c2, t1, t2]) = sample();
        assert_eq!(tree.descendants(row), vec![c1, t1, t2, c2]);
        assert!(tree.descendants(t1).is_empty());
    }
}
