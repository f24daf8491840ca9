//! Node identifiers and the container reference used for parent links.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for placed nodes.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct NodeId(u64);

impl NodeId {
    /// Lowest valid node ID.
    pub const MIN: Self = Self(1);

    /// Create a new node ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, IdError> {
        if raw == 0 {
            return Err(IdError::ZeroId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, IdError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(IdError::Overflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u64> for NodeId {
    type Error = IdError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a node lives: directly under the canvas root, or inside a container.
///
/// This is the `targetContainerId | root` argument of structural operations
/// and the cached parent link on every node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ContainerRef {
    #[default]
    Root,
    Node(NodeId),
}

impl ContainerRef {
    /// Container node ID, or `None` for the root.
    #[must_use]
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Root => None,
            Self::Node(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_root(self) -> bool {
        matches!(self, Self::Root)
    }
}

impl From<NodeId> for ContainerRef {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Node(id) => write!(f, "{id}"),
        }
    }
}

/// Deterministic allocator for node IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdAllocator {
    next: NodeId,
}

impl NodeIdAllocator {
    /// Start allocating from a known ID.
    #[must_use]
    pub const fn with_next(next: NodeId) -> Self {
        Self { next }
    }

    /// Peek at the next ID without consuming.
    #[must_use]
    pub const fn peek(&self) -> NodeId {
        self.next
    }

    /// Allocate the next ID and advance.
    pub fn allocate(&mut self) -> Result<NodeId, IdError> {
        let current = self.next;
        self.next = self.next.checked_next()?;
        Ok(current)
    }

    /// Record an externally chosen ID so later allocations never collide with it.
    pub fn observe(&mut self, id: NodeId) -> Result<(), IdError> {
        if id >= self.next {
            self.next = id.checked_next()?;
        }
        Ok(())
    }
}

impl Default for NodeIdAllocator {
    fn default() -> Self {
        Self { next: NodeId::MIN }
    }
}

/// Errors for node ID construction and allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    ZeroId,
    Overflow { current: NodeId },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroId => write!(f, "node id 0 is invalid"),
            Self::Overflow { current } => write!(f, "node id overflow after {}", current.0),
        }
    }
}

impl std::error::Error for IdError {}
