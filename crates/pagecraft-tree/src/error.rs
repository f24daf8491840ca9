//! Error types for tree mutation, bulk load, and drag sessions.

use std::fmt;

use pagecraft_core::{ContainerRef, EventError, NodeId, NodeKind};

/// Failure of one structural operation on a [`crate::TreeStore`].
///
/// Every failing operation leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A node or container id is not in the tree.
    NotFound { node: NodeId },
    /// The container's nesting rule excludes the child kind.
    KindRejected {
        container: ContainerRef,
        container_kind: Option<NodeKind>,
        child: NodeKind,
    },
    /// The target container is the moved node or one of its descendants.
    CycleDetected { node: NodeId, target: NodeId },
    /// Insertion index outside `[0, len]`.
    InvalidIndex {
        container: ContainerRef,
        index: usize,
        len: usize,
    },
    /// A node with this id already exists.
    DuplicateId { node: NodeId },
    /// The kind has no entry in the registry.
    UnknownKind { kind: NodeKind },
    /// The id allocator ran out of ids.
    IdOverflow { current: NodeId },
    /// A node handed to `add_node` still carries children.
    NotDetached { node: NodeId },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { node } => write!(f, "node {node} not found"),
            Self::KindRejected {
                container,
                container_kind,
                child,
            } => match container_kind {
                Some(kind) => write!(f, "{kind} container {container} does not accept {child}"),
                None => write!(f, "container {container} does not accept {child}"),
            },
            Self::CycleDetected { node, target } => write!(
                f,
                "cannot move node {node} into {target}: target is the node or its descendant"
            ),
            Self::InvalidIndex {
                container,
                index,
                len,
            } => write!(
                f,
                "index {index} out of range for container {container} with {len} children"
            ),
            Self::DuplicateId { node } => write!(f, "node {node} already exists"),
            Self::UnknownKind { kind } => write!(f, "kind {kind} is not registered"),
            Self::IdOverflow { current } => write!(f, "node id overflow after {current}"),
            Self::NotDetached { node } => {
                write!(f, "node {node} must not carry children when added")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Validation failure for a serialized tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeModelError {
    UnsupportedSchemaVersion {
        version: u16,
    },
    DuplicateNodeId {
        node: NodeId,
    },
    UnknownKind {
        node: NodeId,
        kind: NodeKind,
    },
    MissingChild {
        parent: ContainerRef,
        child: NodeId,
    },
    MultipleParents {
        child: NodeId,
        first_parent: ContainerRef,
        second_parent: ContainerRef,
    },
    DuplicateChild {
        parent: ContainerRef,
        child: NodeId,
    },
    ParentMismatch {
        node: NodeId,
        expected: Option<ContainerRef>,
        actual: ContainerRef,
    },
    LeafHasChildren {
        node: NodeId,
        kind: NodeKind,
    },
    KindRejected {
        container: ContainerRef,
        child: NodeId,
        kind: NodeKind,
    },
    CycleDetected {
        node: NodeId,
    },
    UnreachableNode {
        node: NodeId,
    },
    NextIdNotGreaterThanExisting {
        next_id: NodeId,
        max_existing: NodeId,
    },
}

impl fmt::Display for TreeModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { version } => write!(
                f,
                "unsupported tree schema version {version} (expected {})",
                crate::snapshot::TREE_SCHEMA_VERSION
            ),
            Self::DuplicateNodeId { node } => write!(f, "duplicate node id {node}"),
            Self::UnknownKind { node, kind } => {
                write!(f, "node {node} has unregistered kind {kind}")
            }
            Self::MissingChild { parent, child } => {
                write!(f, "container {parent} references missing child {child}")
            }
            Self::MultipleParents {
                child,
                first_parent,
                second_parent,
            } => write!(
                f,
                "node {child} is listed by both {first_parent} and {second_parent}"
            ),
            Self::DuplicateChild { parent, child } => {
                write!(f, "container {parent} lists child {child} more than once")
            }
            Self::ParentMismatch {
                node,
                expected,
                actual,
            } => match expected {
                Some(expected) => write!(
                    f,
                    "node {node} parent mismatch: expected {expected}, got {actual}"
                ),
                None => write!(
                    f,
                    "node {node} claims parent {actual} but no container lists it"
                ),
            },
            Self::LeafHasChildren { node, kind } => {
                write!(f, "leaf node {node} of kind {kind} has children")
            }
            Self::KindRejected {
                container,
                child,
                kind,
            } => write!(
                f,
                "container {container} does not accept node {child} of kind {kind}"
            ),
            Self::CycleDetected { node } => write!(f, "cycle detected at node {node}"),
            Self::UnreachableNode { node } => write!(f, "node {node} is unreachable from root"),
            Self::NextIdNotGreaterThanExisting {
                next_id,
                max_existing,
            } => write!(
                f,
                "next_id {next_id} must be greater than max existing id {max_existing}"
            ),
        }
    }
}

impl TreeModelError {
    /// Stable code for reports.
    #[must_use]
    pub const fn code(&self) -> crate::snapshot::InvariantCode {
        use crate::snapshot::InvariantCode;
        match self {
            Self::UnsupportedSchemaVersion { .. } => InvariantCode::UnsupportedSchemaVersion,
            Self::DuplicateNodeId { .. } => InvariantCode::DuplicateNodeId,
            Self::UnknownKind { .. } => InvariantCode::UnknownKind,
            Self::MissingChild { .. } => InvariantCode::MissingChild,
            Self::MultipleParents { .. } => InvariantCode::MultipleParents,
            Self::DuplicateChild { .. } => InvariantCode::DuplicateChild,
            Self::ParentMismatch { .. } => InvariantCode::ParentMismatch,
            Self::LeafHasChildren { .. } => InvariantCode::LeafHasChildren,
            Self::KindRejected { .. } => InvariantCode::KindRejected,
            Self::CycleDetected { .. } => InvariantCode::CycleDetected,
            Self::UnreachableNode { .. } => InvariantCode::UnreachableNode,
            Self::NextIdNotGreaterThanExisting { .. } => {
                InvariantCode::NextIdNotGreaterThanExisting
            }
        }
    }

    /// Node the finding is about, if any.
    #[must_use]
    pub const fn node(&self) -> Option<NodeId> {
        match *self {
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::DuplicateNodeId { node }
            | Self::UnknownKind { node, .. }
            | Self::ParentMismatch { node, .. }
            | Self::LeafHasChildren { node, .. }
            | Self::CycleDetected { node }
            | Self::UnreachableNode { node } => Some(node),
            Self::MissingChild { child, .. }
            | Self::MultipleParents { child, .. }
            | Self::DuplicateChild { child, .. }
            | Self::KindRejected { child, .. } => Some(child),
            Self::NextIdNotGreaterThanExisting { next_id, .. } => Some(next_id),
        }
    }
}

impl std::error::Error for TreeModelError {}

/// Failure while applying a drag lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The event payload failed validation; the session is unchanged.
    InvalidEvent(EventError),
    /// The tree rejected the resolved mutation; the session has ended.
    Tree(TreeError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEvent(err) => write!(f, "invalid drag event: {err}"),
            Self::Tree(err) => write!(f, "drag commit failed: {err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidEvent(err) => Some(err),
            Self::Tree(err) => Some(err),
        }
    }
}

impl From<EventError> for SessionError {
    fn from(err: EventError) -> Self {
        Self::InvalidEvent(err)
    }
}

impl From<TreeError> for SessionError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw).expect("test ID must be non-zero")
    }

    #[test]
    fn kind_rejected_names_both_kinds() {
        let err = TreeError::KindRejected {
            container: ContainerRef::Node(id(4)),
            container_kind: Some(NodeKind::Row),
            child: NodeKind::Row,
        };
        assert_eq!(err.to_string(), "row container 4 does not accept row");
    }

    #[test]
    fn session_error_exposes_source() {
        use std::error::Error as _;
        let err = SessionError::from(TreeError::NotFound { node: id(9) });
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "drag commit failed: node 9 not found");
    }
}
