//! Drag lifecycle machine.
//!
//! One gesture at a time: `Idle -> Dragging -> Ended -> Idle`. The machine
//! consumes validated [`DragEvent`]s, asks the [`PlacementResolver`] where
//! the drop would land, and only on a successful end applies the result to
//! the [`TreeStore`]. `Ended -> Idle` is immediate, so after an end or cancel
//! the transition reports `to: Ended` while the session is already idle.

use pagecraft_core::{
    CancelReason, ContainerRef, DragEvent, DragSource, DropTarget, EditorConfig, NodeId,
};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, TreeError};
use crate::placement::{Placement, PlacementResolver, Resolution};
use crate::store::TreeStore;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
    Ended,
}

/// State of the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveDrag {
    pub source: DragSource,
    /// Where the dragged node lived at start; `None` for palette drags.
    pub source_container: Option<ContainerRef>,
    /// Most recent hover target, for live feedback only.
    pub last_over: Option<DropTarget>,
    pub last_fraction: f32,
    pub last_resolution: Option<Resolution>,
}

/// Explicit no-op diagnostics for lifecycle events that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    DragAlreadyActive,
    ActiveMismatch,
}

/// Transition effect emitted by one lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        source: DragSource,
        source_container: Option<ContainerRef>,
    },
    Hovered {
        over: Option<DropTarget>,
        resolution: Resolution,
    },
    /// The drop changed the tree.
    Committed {
        node: NodeId,
        placement: Placement,
        /// `true` when the node was constructed from the palette.
        created: bool,
    },
    /// The drop ended without touching the tree.
    Dropped {
        resolution: Resolution,
    },
    Cancelled {
        reason: CancelReason,
        last_over: Option<DropTarget>,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One state-machine transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

/// Lifecycle machine for one drag gesture at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragSession {
    active: Option<ActiveDrag>,
    resolver: PlacementResolver,
    transition_counter: u64,
}

impl DragSession {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            active: None,
            resolver: PlacementResolver::new(config),
            transition_counter: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        if self.active.is_some() {
            DragPhase::Dragging
        } else {
            DragPhase::Idle
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub const fn active(&self) -> Option<&ActiveDrag> {
        self.active.as_ref()
    }

    /// Current hover target, for drawing drop feedback.
    #[must_use]
    pub fn last_over(&self) -> Option<DropTarget> {
        self.active.as_ref().and_then(|active| active.last_over)
    }

    #[must_use]
    pub const fn resolver(&self) -> &PlacementResolver {
        &self.resolver
    }

    /// Unconditionally reset to idle.
    ///
    /// Returns `None` when no drag was active.
    pub fn force_cancel(&mut self) -> Option<DragTransition> {
        let active = self.active.take()?;
        let transition = self.transition(
            DragPhase::Dragging,
            DragPhase::Ended,
            DragEffect::Cancelled {
                reason: CancelReason::Programmatic,
                last_over: active.last_over,
            },
        );
        log_transition(&transition);
        Some(transition)
    }

    /// Apply one lifecycle event.
    ///
    /// An invalid event is rejected before any state changes. A tree error
    /// while committing a drop ends the gesture and leaves the tree as it was.
    pub fn apply_event(
        &mut self,
        tree: &mut TreeStore,
        event: &DragEvent,
    ) -> Result<DragTransition, SessionError> {
        event.validate()?;

        let transition = match (self.active, *event) {
            (None, DragEvent::Start { active }) => {
                let source_container = match active {
                    DragSource::Palette { .. } => None,
                    DragSource::Node { id } => match tree.position_of(id) {
                        Some((container, _)) => Some(container),
                        None => {
                            return Err(SessionError::Tree(TreeError::NotFound { node: id }));
                        }
                    },
                };
                self.active = Some(ActiveDrag {
                    source: active,
                    source_container,
                    last_over: None,
                    last_fraction: 0.0,
                    last_resolution: None,
                });
                self.transition(
                    DragPhase::Idle,
                    DragPhase::Dragging,
                    DragEffect::Started {
                        source: active,
                        source_container,
                    },
                )
            }
            (None, _) => self.noop(DragPhase::Idle, DragNoopReason::IdleWithoutActiveDrag),
            (Some(_), DragEvent::Start { .. }) => {
                self.noop(DragPhase::Dragging, DragNoopReason::DragAlreadyActive)
            }
            (Some(current), event) if event.active() != current.source => {
                self.noop(DragPhase::Dragging, DragNoopReason::ActiveMismatch)
            }
            (Some(mut current), DragEvent::Over { over, fraction, .. }) => {
                let resolution = self.resolver.resolve(tree, current.source, over, fraction);
                current.last_over = over;
                current.last_fraction = fraction;
                current.last_resolution = Some(resolution);
                self.active = Some(current);
                self.transition(
                    DragPhase::Dragging,
                    DragPhase::Dragging,
                    DragEffect::Hovered { over, resolution },
                )
            }
            (Some(current), DragEvent::End { over, fraction, .. }) => {
                self.active = None;
                let resolution = self.resolver.resolve(tree, current.source, over, fraction);
                let effect = match resolution {
                    Resolution::Place { placement } => {
                        match commit(tree, current.source, placement) {
                            Ok(effect) => effect,
                            Err(err) => {
                                let transition = self.transition(
                                    DragPhase::Dragging,
                                    DragPhase::Ended,
                                    DragEffect::Dropped { resolution },
                                );
                                log_transition(&transition);
                                tracing::warn!(
                                    message = "drag.commit_failed",
                                    transition_id = transition.transition_id,
                                    error = %err,
                                );
                                return Err(err.into());
                            }
                        }
                    }
                    Resolution::Noop { .. } | Resolution::Rejected { .. } => {
                        DragEffect::Dropped { resolution }
                    }
                };
                self.transition(DragPhase::Dragging, DragPhase::Ended, effect)
            }
            (Some(current), DragEvent::Cancel { reason, .. }) => {
                self.active = None;
                self.transition(
                    DragPhase::Dragging,
                    DragPhase::Ended,
                    DragEffect::Cancelled {
                        reason,
                        last_over: current.last_over,
                    },
                )
            }
        };

        log_transition(&transition);
        Ok(transition)
    }

    fn noop(&mut self, phase: DragPhase, reason: DragNoopReason) -> DragTransition {
        self.transition(phase, phase, DragEffect::Noop { reason })
    }

    fn transition(&mut self, from: DragPhase, to: DragPhase, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to,
            effect,
        }
    }
}

fn commit(
    tree: &mut TreeStore,
    source: DragSource,
    placement: Placement,
) -> Result<DragEffect, TreeError> {
    match source {
        DragSource::Palette { kind } => {
            let id = tree.add_new_node(kind, placement.container, placement.index)?;
            Ok(DragEffect::Committed {
                node: id,
                placement,
                created: true,
            })
        }
        DragSource::Node { id } => {
            tree.move_node(id, placement.container, placement.index)?;
            Ok(DragEffect::Committed {
                node: id,
                placement,
                created: false,
            })
        }
    }
}

fn log_transition(transition: &DragTransition) {
    match transition.effect {
        DragEffect::Committed {
            node,
            placement,
            created,
        } => tracing::debug!(
            message = "drag.committed",
            transition_id = transition.transition_id,
            node = node.get(),
            container = %placement.container,
            index = placement.index,
            created,
        ),
        DragEffect::Noop { reason } => tracing::trace!(
            message = "drag.noop",
            transition_id = transition.transition_id,
            reason = ?reason,
        ),
        DragEffect::Hovered { .. } => tracing::trace!(
            message = "drag.hovered",
            transition_id = transition.transition_id,
        ),
        DragEffect::Started { .. } | DragEffect::Dropped { .. } | DragEffect::Cancelled { .. } => {
            tracing::debug!(
                message = "drag.transition",
                transition_id = transition.transition_id,
                from = ?transition.from,
                to = ?transition.to,
            );
        }
    }
}
