#![forbid(unsafe_code)]

//! Pagecraft public facade crate.
//!
//! Re-exports the editing core for page-builder hosts and offers a prelude
//! for day-to-day use. Hosts own rendering and input; they feed
//! [`DragEvent`] and [`CanvasEvent`] values into an [`Editor`] and draw from
//! its [`TreeSnapshot`].

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use pagecraft_core::{
    AttributeError, Attributes, CancelReason, CanvasEvent, ConfigError, ContainerRef, DragEvent,
    DragSource, DropTarget, EditorConfig, EventError, IdError, LayoutAxis, NodeId,
    NodeIdAllocator, NodeKind,
};

#[cfg(feature = "tracing-json")]
pub use pagecraft_core::logging::{LoggingInitError, init_json};

// --- Tree re-exports -------------------------------------------------------

pub use pagecraft_tree::{
    ContainerKind, ContainerSpec, DragEffect, DragNoopReason, DragPhase, DragSession,
    DragTransition, DropEdge, DropIndicator, Editor, InvariantCode, InvariantReport, KindSpec,
    NodeInstance, NodeRecord, NodeRegistry, PaletteEntry, Placement, PlacementResolver, Rejection,
    Resolution, Selection, SessionError, TREE_SCHEMA_VERSION, TreeError, TreeModelError,
    TreeSnapshot, TreeStore,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Pagecraft hosts.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Id allocation or parsing failed.
    Id(IdError),
    /// Editor configuration was rejected.
    Config(ConfigError),
    /// Drag or click payload was malformed.
    Event(EventError),
    /// Attribute JSON was not an object or did not parse.
    Attributes(AttributeError),
    /// A structural edit was refused; the tree is unchanged.
    Tree(TreeError),
    /// A stored tree failed validation on load.
    Model(TreeModelError),
    /// A drag lifecycle event could not be applied.
    Session(SessionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Event(err) => write!(f, "{err}"),
            Self::Attributes(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Model(err) => write!(f, "invalid stored tree: {err}"),
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Id(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Event(err) => Some(err),
            Self::Attributes(err) => Some(err),
            Self::Tree(err) => Some(err),
            Self::Model(err) => Some(err),
            Self::Session(err) => Some(err),
        }
    }
}

impl From<IdError> for Error {
    fn from(err: IdError) -> Self {
        Self::Id(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<EventError> for Error {
    fn from(err: EventError) -> Self {
        Self::Event(err)
    }
}

impl From<AttributeError> for Error {
    fn from(err: AttributeError) -> Self {
        Self::Attributes(err)
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<TreeModelError> for Error {
    fn from(err: TreeModelError) -> Self {
        Self::Model(err)
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

/// Standard result type for Pagecraft APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Attributes, CanvasEvent, ContainerRef, DragEffect, DragEvent, DragSource, DropTarget,
        Editor, EditorConfig, Error, NodeId, NodeKind, Placement, Resolution, Result,
        TreeSnapshot,
    };

    pub use crate::{core, tree};
}

pub use pagecraft_core as core;
pub use pagecraft_tree as tree;
