//! Placement resolution: where a hovered drop would land.
//!
//! The resolver turns "source S is over target T at fraction F along T's
//! layout axis" into a `(container, index)` decision. It reads the tree and
//! never mutates it.
//!
//! - Leaf targets split in two halves at `half_split`: before or after the
//!   leaf in its parent.
//! - Container targets (and the canvas root) have a rim band at each edge of
//!   width `rim_fraction`. The leading rim inserts at index 0; the trailing
//!   rim and the body append.
//! - A container hovering over itself is a no-op on its rims and a cycle
//!   on its body.
//! - Indices in a returned [`Placement`] are already adjusted for the
//!   removal shift of a same-container move, so they can be passed straight
//!   to [`TreeStore::move_node`].

use pagecraft_core::{ContainerRef, DragSource, DropTarget, EditorConfig, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

use crate::registry::ContainerKind;
use crate::store::TreeStore;

/// A resolved `(container, index)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub container: ContainerRef,
    pub index: usize,
}

impl Placement {
    #[must_use]
    pub const fn new(container: ContainerRef, index: usize) -> Self {
        Self { container, index }
    }
}

/// Why no placement exists for the current hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rejection", rename_all = "snake_case")]
pub enum Rejection {
    /// The pointer is not over any drop area.
    NoTarget,
    /// The dragged node or the hovered node is not in the tree.
    UnknownNode { node: NodeId },
    /// The container's nesting rule excludes the dragged kind.
    KindRejected {
        container: ContainerRef,
        child: NodeKind,
    },
    /// The container is the dragged node or one of its descendants.
    CycleDetected { node: NodeId, container: NodeId },
}

/// Outcome of one resolver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    /// A legal placement that changes the tree.
    Place { placement: Placement },
    /// A legal placement equal to the node's current position.
    Noop { placement: Placement },
    Rejected { rejection: Rejection },
}

impl Resolution {
    /// The placement, for both real moves and same-position drops.
    #[must_use]
    pub const fn placement(&self) -> Option<Placement> {
        match *self {
            Self::Place { placement } | Self::Noop { placement } => Some(placement),
            Self::Rejected { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_place(&self) -> bool {
        matches!(self, Self::Place { .. })
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop { .. })
    }

    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match *self {
            Self::Rejected { rejection } => Some(rejection),
            Self::Place { .. } | Self::Noop { .. } => None,
        }
    }

    const fn rejected(rejection: Rejection) -> Self {
        Self::Rejected { rejection }
    }
}

/// Band of a container the pointer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerZone {
    LeadingRim,
    Body,
    TrailingRim,
}

impl ContainerZone {
    /// Classify `fraction` along the container axis.
    #[must_use]
    pub fn classify(fraction: f32, rim_fraction: f32) -> Self {
        if fraction < rim_fraction {
            Self::LeadingRim
        } else if fraction > 1.0 - rim_fraction {
            Self::TrailingRim
        } else {
            Self::Body
        }
    }
}

/// Where a renderer should draw the insertion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "edge", content = "node", rename_all = "snake_case")]
pub enum DropEdge {
    Before(NodeId),
    After(NodeId),
    /// Leading edge of an empty or rim-hovered container.
    Start,
    /// Trailing edge of the container.
    End,
}

/// Drop marker in terms of the tree as it is now, before any removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropIndicator {
    pub container: ContainerRef,
    /// Index in the current children list.
    pub index: usize,
    pub edge: DropEdge,
}

/// Pure placement computation over a [`TreeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlacementResolver {
    config: EditorConfig,
}

impl PlacementResolver {
    #[must_use]
    pub const fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> EditorConfig {
        self.config
    }

    /// Resolve a hover into a placement decision.
    #[must_use]
    pub fn resolve(
        &self,
        tree: &TreeStore,
        source: DragSource,
        over: Option<DropTarget>,
        fraction: f32,
    ) -> Resolution {
        self.resolve_with_indicator(tree, source, over, fraction).0
    }

    /// Drop marker for a hover, only when the drop would change the tree.
    #[must_use]
    pub fn indicator(
        &self,
        tree: &TreeStore,
        source: DragSource,
        over: Option<DropTarget>,
        fraction: f32,
    ) -> Option<DropIndicator> {
        self.resolve_with_indicator(tree, source, over, fraction).1
    }

    fn resolve_with_indicator(
        &self,
        tree: &TreeStore,
        source: DragSource,
        over: Option<DropTarget>,
        fraction: f32,
    ) -> (Resolution, Option<DropIndicator>) {
        let Some(over) = over else {
            return (Resolution::rejected(Rejection::NoTarget), None);
        };

        let dragged_kind = match source {
            DragSource::Palette { kind } => kind,
            DragSource::Node { id } => match tree.node(id) {
                Some(node) => node.kind(),
                None => return (Resolution::rejected(Rejection::UnknownNode { node: id }), None),
            },
        };

        if let (DragSource::Node { id }, DropTarget::Node { id: over_id }) = (source, over)
            && id == over_id
        {
            // A container's body means "drop inside me"; only its rims and
            // leaves hovering themselves stay put.
            if tree.registry().is_container(dragged_kind)
                && ContainerZone::classify(fraction, self.config.rim_fraction())
                    == ContainerZone::Body
            {
                tracing::trace!(
                    message = "drag.cycle_rejected",
                    node = id.get(),
                    container = id.get(),
                );
                return (
                    Resolution::rejected(Rejection::CycleDetected {
                        node: id,
                        container: id,
                    }),
                    None,
                );
            }
            return match tree.position_of(id) {
                Some((container, index)) => (
                    Resolution::Noop {
                        placement: Placement::new(container, index),
                    },
                    None,
                ),
                None => (Resolution::rejected(Rejection::UnknownNode { node: id }), None),
            };
        }

        let (indicator, container_kind) = match self.candidate(tree, over, fraction) {
            Ok(candidate) => candidate,
            Err(rejection) => return (Resolution::rejected(rejection), None),
        };

        if !tree.registry().can_accept(container_kind, dragged_kind) {
            tracing::trace!(
                message = "drag.kind_rejected",
                container = %indicator.container,
                kind = dragged_kind.as_str(),
            );
            return (
                Resolution::rejected(Rejection::KindRejected {
                    container: indicator.container,
                    child: dragged_kind,
                }),
                None,
            );
        }

        let DragSource::Node { id } = source else {
            return (
                Resolution::Place {
                    placement: Placement::new(indicator.container, indicator.index),
                },
                Some(indicator),
            );
        };

        if let ContainerRef::Node(container_id) = indicator.container
            && (container_id == id || tree.is_ancestor(id, container_id))
        {
            tracing::trace!(
                message = "drag.cycle_rejected",
                node = id.get(),
                container = container_id.get(),
            );
            return (
                Resolution::rejected(Rejection::CycleDetected {
                    node: id,
                    container: container_id,
                }),
                None,
            );
        }

        let Some(current) = tree.position_of(id) else {
            return (Resolution::rejected(Rejection::UnknownNode { node: id }), None);
        };
        let mut index = indicator.index;
        if current.0 == indicator.container && current.1 < index {
            index -= 1;
        }
        let placement = Placement::new(indicator.container, index);
        if (placement.container, placement.index) == current {
            (Resolution::Noop { placement }, None)
        } else {
            (Resolution::Place { placement }, Some(indicator))
        }
    }

    /// Raw insertion point in the current tree, before any shift adjustment,
    /// plus the kind of the container it points into.
    fn candidate(
        &self,
        tree: &TreeStore,
        over: DropTarget,
        fraction: f32,
    ) -> Result<(DropIndicator, ContainerKind), Rejection> {
        let over_id = match over {
            DropTarget::Canvas => {
                let len = tree.root_children().len();
                let indicator = self.container_edge(ContainerRef::Root, len, fraction);
                return Ok((indicator, ContainerKind::Root));
            }
            DropTarget::Node { id } => id,
        };
        let Some(node) = tree.node(over_id) else {
            return Err(Rejection::UnknownNode { node: over_id });
        };

        if tree.registry().is_container(node.kind()) {
            let indicator =
                self.container_edge(over_id.into(), node.children().len(), fraction);
            return Ok((indicator, ContainerKind::Kind(node.kind())));
        }

        let Some((container, index)) = tree.position_of(over_id) else {
            return Err(Rejection::UnknownNode { node: over_id });
        };
        let Some(container_kind) = tree.kind_of(container) else {
            return Err(Rejection::UnknownNode { node: over_id });
        };
        let indicator = if fraction >= self.config.half_split() {
            DropIndicator {
                container,
                index: index + 1,
                edge: DropEdge::After(over_id),
            }
        } else {
            DropIndicator {
                container,
                index,
                edge: DropEdge::Before(over_id),
            }
        };
        Ok((indicator, container_kind))
    }

    fn container_edge(&self, container: ContainerRef, len: usize, fraction: f32) -> DropIndicator {
        match ContainerZone::classify(fraction, self.config.rim_fraction()) {
            ContainerZone::LeadingRim => DropIndicator {
                container,
                index: 0,
                edge: DropEdge::Start,
            },
            ContainerZone::Body | ContainerZone::TrailingRim => DropIndicator {
                container,
                index: len,
                edge: DropEdge::End,
            },
        }
    }
}
