//! Placed node instances.

use pagecraft_core::{Attributes, ContainerRef, NodeId, NodeKind};

/// One placed building block.
///
/// `id` and `kind` never change. `children` and `parent` are maintained only
/// by [`crate::TreeStore`]; callers can read them but have no way to write
/// them, so the parent link cannot drift from the children lists.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInstance {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) attributes: Attributes,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: ContainerRef,
}

impl NodeInstance {
    /// Detached instance with no children, parented to the root until placed.
    pub(crate) fn detached(id: NodeId, kind: NodeKind, attributes: Attributes) -> Self {
        Self {
            id,
            kind,
            attributes,
            children: Vec::new(),
            parent: ContainerRef::Root,
        }
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable attribute access for a node that is not yet in a tree.
    ///
    /// Placed nodes are edited through [`crate::TreeStore::update_attributes`].
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Ordered child ids; always empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Owning container, or [`ContainerRef::Root`].
    #[must_use]
    pub const fn parent(&self) -> ContainerRef {
        self.parent
    }

    /// Convenience label lookup.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.attributes.get_str("label")
    }
}
