#![forbid(unsafe_code)]

//! Core: node identity, node kinds, attribute maps, and drag lifecycle events.
//!
//! # Role in Pagecraft
//! `pagecraft-core` is the vocabulary layer. It owns the small value types
//! every other crate speaks in, but none of the tree logic.
//!
//! # Primary responsibilities
//! - **NodeId / ContainerRef**: stable identifiers and the `root` sentinel.
//! - **NodeKind / LayoutAxis**: the tag catalog for building blocks.
//! - **Attributes**: per-instance configuration with shallow-merge patches.
//! - **DragEvent / CanvasEvent**: the abstract lifecycle emitted by sensors.
//! - **EditorConfig**: rim and half-zone tuning with environment overrides.
//!
//! # How it fits in the system
//! `pagecraft-tree` consumes these types to maintain the node tree and to
//! resolve drag gestures into placements. Input sensors live outside this
//! workspace and only need to produce [`event::DragEvent`] values.

pub mod attributes;
pub mod config;
pub mod event;
pub mod id;
pub mod kind;
pub mod logging;

pub use attributes::{AttributeError, Attributes};
pub use config::{ConfigError, EditorConfig};
pub use event::{CancelReason, CanvasEvent, DragEvent, DragSource, DropTarget, EventError};
pub use id::{ContainerRef, IdError, NodeId, NodeIdAllocator};
pub use kind::{LayoutAxis, NodeKind};
