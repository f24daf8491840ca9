//! Single-node selection for the properties inspector.

use pagecraft_core::{CanvasEvent, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::store::TreeStore;

/// At most one selected node. Independent of drag state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    selected: Option<NodeId>,
}

impl Selection {
    #[must_use]
    pub const fn new() -> Self {
        Self { selected: None }
    }

    #[must_use]
    pub const fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    #[must_use]
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected == Some(id)
    }

    /// Select a node that exists in `tree`.
    pub fn select(&mut self, tree: &TreeStore, id: NodeId) -> Result<(), TreeError> {
        if !tree.contains(id) {
            return Err(TreeError::NotFound { node: id });
        }
        if self.selected != Some(id) {
            tracing::debug!(message = "selection.changed", node = id.get());
        }
        self.selected = Some(id);
        Ok(())
    }

    /// Clear the selection, returning what was selected.
    pub fn clear(&mut self) -> Option<NodeId> {
        let previous = self.selected.take();
        if let Some(previous) = previous {
            tracing::debug!(message = "selection.cleared", node = previous.get());
        }
        previous
    }

    /// Drop the selection if it is among `removed`. Returns `true` if cleared.
    pub fn prune(&mut self, removed: &[NodeId]) -> bool {
        match self.selected {
            Some(id) if removed.contains(&id) => {
                let _ = self.clear();
                true
            }
            _ => false,
        }
    }

    /// Apply a click already classified as "not a drag".
    pub fn handle_canvas_event(
        &mut self,
        tree: &TreeStore,
        event: CanvasEvent,
    ) -> Result<Option<NodeId>, TreeError> {
        match event {
            CanvasEvent::NodeClicked { id } => self.select(tree, id)?,
            CanvasEvent::BackgroundClicked => {
                let _ = self.clear();
            }
        }
        Ok(self.selected)
    }
}
