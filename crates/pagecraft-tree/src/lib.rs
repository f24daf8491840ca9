#![forbid(unsafe_code)]

//! Tree editing for the page builder.
//!
//! # Role in Pagecraft
//! `pagecraft-tree` owns the node tree and every rule about how it may
//! change: which kinds nest inside which, where a drag gesture lands, and
//! how one gesture is tracked from start to drop.
//!
//! # Primary responsibilities
//! - **NodeRegistry**: the kind behavior table (defaults, nesting, axis).
//! - **TreeStore**: the single owner of structure; all mutation is
//!   all-or-nothing and keeps parent links consistent.
//! - **PlacementResolver**: pure `(target, fraction) -> (container, index)`
//!   decisions with rim and half-zone policies.
//! - **DragSession**: the `Idle -> Dragging -> Ended` lifecycle.
//! - **Selection**: the single selected node for property editing.
//! - **Editor**: one place that wires the above together.
//!
//! # How it fits in the system
//! Input sensors produce `pagecraft_core::DragEvent` values. The
//! [`Editor`] feeds them to its [`DragSession`], which consults the
//! [`PlacementResolver`] and applies the result to its [`TreeStore`].
//! Renderers and the persistence layer read [`TreeSnapshot`] values.

pub mod editor;
pub mod error;
pub mod node;
pub mod placement;
pub mod registry;
pub mod selection;
pub mod session;
pub mod snapshot;
pub mod store;

pub use editor::Editor;
pub use error::{SessionError, TreeError, TreeModelError};
pub use node::NodeInstance;
pub use placement::{
    ContainerZone, DropEdge, DropIndicator, Placement, PlacementResolver, Rejection, Resolution,
};
pub use registry::{ContainerKind, ContainerSpec, KindSpec, NodeRegistry, PaletteEntry};
pub use selection::Selection;
pub use session::{ActiveDrag, DragEffect, DragNoopReason, DragPhase, DragSession, DragTransition};
pub use snapshot::{
    InvariantCode, InvariantIssue, InvariantReport, NodeRecord, TREE_SCHEMA_VERSION, TreeSnapshot,
};
pub use store::TreeStore;
