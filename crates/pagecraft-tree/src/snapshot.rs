//! Serializable tree snapshots, invariant reports, and state hashing.
//!
//! A [`TreeSnapshot`] is an owned value. Renderers draw from it and the
//! persistence layer serializes it; neither can reach back into the live
//! store through it.

use std::collections::{BTreeMap, BTreeSet};

use pagecraft_core::{Attributes, ContainerRef, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

use crate::error::TreeModelError;
use crate::registry::{ContainerKind, NodeRegistry};

/// Current serialized tree schema version.
pub const TREE_SCHEMA_VERSION: u16 = 1;

/// Serializable node record in the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub parent: ContainerRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Canonical serialized tree shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub next_id: NodeId,
    pub root: Vec<NodeId>,
    pub nodes: Vec<NodeRecord>,
}

fn default_schema_version() -> u16 {
    TREE_SCHEMA_VERSION
}

impl Default for TreeSnapshot {
    fn default() -> Self {
        Self {
            schema_version: TREE_SCHEMA_VERSION,
            next_id: NodeId::MIN,
            root: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

impl TreeSnapshot {
    /// Canonicalize node ordering by ID for deterministic serialization.
    pub fn canonicalize(&mut self) {
        self.nodes.sort_by_key(|node| node.id);
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Deterministic hash over structure and attributes.
    ///
    /// Two snapshots hash equal iff they list the same nodes in the same
    /// order with the same parents, children, and attributes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        snapshot_state_hash(self)
    }

    /// Inspect invariants and emit a structured diagnostics report.
    #[must_use]
    pub fn invariant_report(&self, registry: &NodeRegistry) -> InvariantReport {
        let issues = collect_model_errors(self, registry)
            .into_iter()
            .map(|err| InvariantIssue {
                code: err.code(),
                node: err.node(),
                message: err.to_string(),
            })
            .collect();
        InvariantReport {
            snapshot_hash: self.state_hash(),
            issues,
        }
    }

    /// Validate against `registry`, reporting the first violation found.
    pub fn validate(&self, registry: &NodeRegistry) -> Result<(), TreeModelError> {
        match collect_model_errors(self, registry).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    UnsupportedSchemaVersion,
    DuplicateNodeId,
    UnknownKind,
    MissingChild,
    MultipleParents,
    DuplicateChild,
    ParentMismatch,
    LeafHasChildren,
    KindRejected,
    CycleDetected,
    UnreachableNode,
    NextIdNotGreaterThanExisting,
}

/// One invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub node: Option<NodeId>,
    pub message: String,
}

/// Structured invariant report over a tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub snapshot_hash: u64,
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn has_code(&self, code: InvariantCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

fn collect_model_errors(snapshot: &TreeSnapshot, registry: &NodeRegistry) -> Vec<TreeModelError> {
    let mut errors = Vec::new();

    if snapshot.schema_version != TREE_SCHEMA_VERSION {
        errors.push(TreeModelError::UnsupportedSchemaVersion {
            version: snapshot.schema_version,
        });
    }

    let mut nodes: BTreeMap<NodeId, &NodeRecord> = BTreeMap::new();
    for node in &snapshot.nodes {
        if nodes.insert(node.id, node).is_some() {
            errors.push(TreeModelError::DuplicateNodeId { node: node.id });
        }
    }

    if let Some(max_existing) = nodes.keys().next_back().copied()
        && snapshot.next_id <= max_existing
    {
        errors.push(TreeModelError::NextIdNotGreaterThanExisting {
            next_id: snapshot.next_id,
            max_existing,
        });
    }

    let mut expected_parents: BTreeMap<NodeId, ContainerRef> = BTreeMap::new();
    check_child_list(
        ContainerRef::Root,
        ContainerKind::Root,
        &snapshot.root,
        &nodes,
        registry,
        &mut expected_parents,
        &mut errors,
    );

    for node in nodes.values() {
        if !registry.contains(node.kind) {
            errors.push(TreeModelError::UnknownKind {
                node: node.id,
                kind: node.kind,
            });
            continue;
        }
        if !registry.is_container(node.kind) {
            if !node.children.is_empty() {
                errors.push(TreeModelError::LeafHasChildren {
                    node: node.id,
                    kind: node.kind,
                });
            }
            continue;
        }
        check_child_list(
            ContainerRef::Node(node.id),
            ContainerKind::Kind(node.kind),
            &node.children,
            &nodes,
            registry,
            &mut expected_parents,
            &mut errors,
        );
    }

    for node in nodes.values() {
        let expected = expected_parents.get(&node.id).copied();
        if expected != Some(node.parent) {
            errors.push(TreeModelError::ParentMismatch {
                node: node.id,
                expected,
                actual: node.parent,
            });
        }
    }

    let mut reachable = BTreeSet::new();
    let mut stack: Vec<NodeId> = snapshot.root.iter().rev().copied().collect();
    while let Some(node_id) = stack.pop() {
        if !reachable.insert(node_id) {
            continue;
        }
        if let Some(node) = nodes.get(&node_id) {
            stack.extend(node.children.iter().rev().copied());
        }
    }

    let mut visiting = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut cycle_nodes = BTreeSet::new();
    for node_id in nodes.keys() {
        dfs_collect_cycles(
            *node_id,
            &nodes,
            &mut visiting,
            &mut visited,
            &mut cycle_nodes,
        );
    }
    for node_id in &cycle_nodes {
        errors.push(TreeModelError::CycleDetected { node: *node_id });
    }
    for node_id in nodes.keys() {
        if !reachable.contains(node_id) && !cycle_nodes.contains(node_id) {
            errors.push(TreeModelError::UnreachableNode { node: *node_id });
        }
    }

    errors
}

fn check_child_list(
    parent: ContainerRef,
    parent_kind: ContainerKind,
    children: &[NodeId],
    nodes: &BTreeMap<NodeId, &NodeRecord>,
    registry: &NodeRegistry,
    expected_parents: &mut BTreeMap<NodeId, ContainerRef>,
    errors: &mut Vec<TreeModelError>,
) {
    for child in children {
        let Some(record) = nodes.get(child) else {
            errors.push(TreeModelError::MissingChild {
                parent,
                child: *child,
            });
            continue;
        };
        match expected_parents.insert(*child, parent) {
            Some(first_parent) if first_parent == parent => {
                errors.push(TreeModelError::DuplicateChild {
                    parent,
                    child: *child,
                });
            }
            Some(first_parent) => {
                let _ = expected_parents.insert(*child, first_parent);
                errors.push(TreeModelError::MultipleParents {
                    child: *child,
                    first_parent,
                    second_parent: parent,
                });
            }
            None => {}
        }
        if registry.contains(record.kind) && !registry.can_accept(parent_kind, record.kind) {
            errors.push(TreeModelError::KindRejected {
                container: parent,
                child: *child,
                kind: record.kind,
            });
        }
    }
}

fn dfs_collect_cycles(
    node_id: NodeId,
    nodes: &BTreeMap<NodeId, &NodeRecord>,
    visiting: &mut BTreeSet<NodeId>,
    visited: &mut BTreeSet<NodeId>,
    cycle_nodes: &mut BTreeSet<NodeId>,
) {
    if visiting.contains(&node_id) {
        let _ = cycle_nodes.insert(node_id);
        return;
    }
    if !visited.insert(node_id) {
        return;
    }

    let _ = visiting.insert(node_id);
    if let Some(node) = nodes.get(&node_id) {
        for child in &node.children {
            if nodes.contains_key(child) {
                dfs_collect_cycles(*child, nodes, visiting, visited, cycle_nodes);
            }
        }
    }
    let _ = visiting.remove(&node_id);
}

fn snapshot_state_hash(snapshot: &TreeSnapshot) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    fn mix(hash: &mut u64, byte: u8) {
        *hash ^= u64::from(byte);
        *hash = hash.wrapping_mul(PRIME);
    }

    fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
        for byte in bytes {
            mix(hash, *byte);
        }
    }

    fn mix_u16(hash: &mut u64, value: u16) {
        mix_bytes(hash, &value.to_le_bytes());
    }

    fn mix_u64(hash: &mut u64, value: u64) {
        mix_bytes(hash, &value.to_le_bytes());
    }

    fn mix_str(hash: &mut u64, value: &str) {
        mix_u64(hash, value.len() as u64);
        mix_bytes(hash, value.as_bytes());
    }

    fn mix_ids(hash: &mut u64, ids: &[NodeId]) {
        mix_u64(hash, ids.len() as u64);
        for id in ids {
            mix_u64(hash, id.get());
        }
    }

    fn mix_container(hash: &mut u64, container: ContainerRef) {
        match container {
            ContainerRef::Root => mix(hash, 0),
            ContainerRef::Node(id) => {
                mix(hash, 1);
                mix_u64(hash, id.get());
            }
        }
    }

    fn mix_attributes(hash: &mut u64, attributes: &Attributes) {
        mix_u64(hash, attributes.len() as u64);
        for (key, value) in attributes.iter() {
            mix_str(hash, key);
            mix_str(hash, &value.to_string());
        }
    }

    let mut hash = OFFSET_BASIS;
    mix_u16(&mut hash, snapshot.schema_version);
    mix_u64(&mut hash, snapshot.next_id.get());
    mix_ids(&mut hash, &snapshot.root);
    mix_u64(&mut hash, snapshot.nodes.len() as u64);
    for node in &snapshot.nodes {
        mix_u64(&mut hash, node.id.get());
        mix_str(&mut hash, node.kind.as_str());
        mix_container(&mut hash, node.parent);
        mix_ids(&mut hash, &node.children);
        mix_attributes(&mut hash, &node.attributes);
    }
    hash
}
