//! Abstract drag lifecycle and canvas click events.
//!
//! Input sensors (pointer, touch, keyboard) are outside this workspace. They
//! debounce raw input, decide whether a gesture is a click or a drag, and
//! emit the values defined here. The only geometry that crosses the boundary
//! is one scalar: how far along the hovered element's layout axis the
//! pointer sits, as a fraction in `[0, 1]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::kind::NodeKind;

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DragSource {
    /// A palette button; no tree node exists until the drop commits.
    Palette { kind: NodeKind },
    /// An existing tree node.
    Node { id: NodeId },
}

impl DragSource {
    #[must_use]
    pub const fn palette(kind: NodeKind) -> Self {
        Self::Palette { kind }
    }

    #[must_use]
    pub const fn node(id: NodeId) -> Self {
        Self::Node { id }
    }

    /// Tree node being dragged, if any.
    #[must_use]
    pub const fn node_id(self) -> Option<NodeId> {
        match self {
            Self::Palette { .. } => None,
            Self::Node { id } => Some(id),
        }
    }
}

/// What the pointer is currently over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum DropTarget {
    /// The canvas background itself (the root drop area).
    Canvas,
    /// A placed node, container or leaf.
    Node { id: NodeId },
}

impl DropTarget {
    #[must_use]
    pub const fn node(id: NodeId) -> Self {
        Self::Node { id }
    }
}

/// Why a drag gesture was abandoned by the sensor layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    EscapeKey,
    PointerLost,
    FocusLost,
    Programmatic,
}

/// One abstract drag lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    Start {
        active: DragSource,
    },
    Over {
        active: DragSource,
        over: Option<DropTarget>,
        fraction: f32,
    },
    End {
        active: DragSource,
        over: Option<DropTarget>,
        fraction: f32,
    },
    Cancel {
        active: DragSource,
        reason: CancelReason,
    },
}

impl DragEvent {
    /// The dragged source this event refers to.
    #[must_use]
    pub const fn active(&self) -> DragSource {
        match *self {
            Self::Start { active }
            | Self::Over { active, .. }
            | Self::End { active, .. }
            | Self::Cancel { active, .. } => active,
        }
    }

    /// Stable event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Over { .. } => "over",
            Self::End { .. } => "end",
            Self::Cancel { .. } => "cancel",
        }
    }

    /// Validate event payload invariants.
    pub fn validate(&self) -> Result<(), EventError> {
        match *self {
            Self::Over { fraction, .. } | Self::End { fraction, .. } => {
                if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
                    return Err(EventError::FractionOutOfRange { fraction });
                }
                Ok(())
            }
            Self::Start { .. } | Self::Cancel { .. } => Ok(()),
        }
    }
}

/// A click that the sensor layer has already classified as "not a drag".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CanvasEvent {
    NodeClicked { id: NodeId },
    BackgroundClicked,
}

/// Event payload validation failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventError {
    FractionOutOfRange { fraction: f32 },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FractionOutOfRange { fraction } => {
                write!(f, "pointer fraction {fraction} must be within [0, 1]")
            }
        }
    }
}

impl std::error::Error for EventError {}
