//! Composition root for one editing session.
//!
//! [`Editor`] owns the tree, the drag session, and the selection, and is
//! the one object a host passes around. Renderers read through it; every
//! structural change goes through its methods, which delegate to the
//! [`TreeStore`] so the tree invariants are enforced in one place.

use std::sync::Arc;

use pagecraft_core::{
    Attributes, CanvasEvent, ContainerRef, DragEvent, EditorConfig, NodeId, NodeKind,
};

use crate::error::{SessionError, TreeError, TreeModelError};
use crate::node::NodeInstance;
use crate::placement::DropIndicator;
use crate::registry::NodeRegistry;
use crate::selection::Selection;
use crate::session::{DragSession, DragTransition};
use crate::snapshot::TreeSnapshot;
use crate::store::TreeStore;

#[derive(Debug, Clone, Default)]
pub struct Editor {
    tree: TreeStore,
    session: DragSession,
    selection: Selection,
    config: EditorConfig,
}

impl Editor {
    /// Empty canvas with the standard kind catalog.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self::with_registry(Arc::new(NodeRegistry::standard()), config)
    }

    #[must_use]
    pub fn with_registry(registry: Arc<NodeRegistry>, config: EditorConfig) -> Self {
        Self {
            tree: TreeStore::new(registry),
            session: DragSession::new(config),
            selection: Selection::new(),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> EditorConfig {
        self.config
    }

    #[must_use]
    pub const fn tree(&self) -> &TreeStore {
        &self.tree
    }

    #[must_use]
    pub const fn session(&self) -> &DragSession {
        &self.session
    }

    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    #[must_use]
    pub fn snapshot(&self) -> TreeSnapshot {
        self.tree.snapshot()
    }

    /// Replace the whole tree with a stored one.
    ///
    /// Any drag in progress is cancelled and the selection is cleared. On
    /// error the current tree is kept.
    pub fn load_snapshot(&mut self, snapshot: TreeSnapshot) -> Result<(), TreeModelError> {
        let tree = TreeStore::from_snapshot(self.tree.registry_handle(), snapshot)?;
        let _ = self.session.force_cancel();
        let _ = self.selection.clear();
        self.tree = tree;
        Ok(())
    }

    pub fn handle_drag_event(&mut self, event: &DragEvent) -> Result<DragTransition, SessionError> {
        self.session.apply_event(&mut self.tree, event)
    }

    pub fn handle_canvas_event(&mut self, event: CanvasEvent) -> Result<Option<NodeId>, TreeError> {
        self.selection.handle_canvas_event(&self.tree, event)
    }

    /// Construct a node of `kind` and insert it at `index` in `target`.
    pub fn add_from_palette(
        &mut self,
        kind: NodeKind,
        target: ContainerRef,
        index: usize,
    ) -> Result<NodeId, TreeError> {
        self.tree.add_new_node(kind, target, index)
    }

    /// Construct a node of `kind` and append it to the canvas root.
    pub fn append_from_palette(&mut self, kind: NodeKind) -> Result<NodeId, TreeError> {
        let index = self.tree.root_children().len();
        self.add_from_palette(kind, ContainerRef::Root, index)
    }

    pub fn move_node(
        &mut self,
        id: NodeId,
        target: ContainerRef,
        index: usize,
    ) -> Result<(), TreeError> {
        self.tree.move_node(id, target, index)
    }

    /// Remove a subtree; clears the selection if it was inside it.
    ///
    /// A drag whose source node was in the subtree is cancelled, so the
    /// session is idle again for the next gesture.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let removed = self.tree.remove_node(id)?;
        let _ = self.selection.prune(&removed);
        let source_removed = self
            .session
            .active()
            .and_then(|active| active.source.node_id())
            .is_some_and(|source| removed.contains(&source));
        if source_removed {
            let _ = self.session.force_cancel();
        }
        Ok(removed)
    }

    pub fn select(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.selection.select(&self.tree, id)
    }

    pub fn update_attributes(
        &mut self,
        id: NodeId,
        patch: Attributes,
    ) -> Result<Vec<String>, TreeError> {
        self.tree.update_attributes(id, patch)
    }

    /// Patch the selected node; `Ok(None)` when nothing is selected.
    pub fn update_selected_attributes(
        &mut self,
        patch: Attributes,
    ) -> Result<Option<Vec<String>>, TreeError> {
        match self.selection.selected() {
            Some(id) => self.tree.update_attributes(id, patch).map(Some),
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn selected_node(&self) -> Option<&NodeInstance> {
        self.selection
            .selected()
            .and_then(|id| self.tree.node(id))
    }

    /// Insertion marker for the drag in progress, if its drop would change the tree.
    #[must_use]
    pub fn drop_indicator(&self) -> Option<DropIndicator> {
        let active = self.session.active()?;
        self.session.resolver().indicator(
            &self.tree,
            active.source,
            active.last_over,
            active.last_fraction,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::DropEdge;
    use crate::session::{DragEffect, DragPhase};
    use pagecraft_core::{DragSource, DropTarget};
    use serde_json::json;

    #[test]
    fn removing_selected_ancestor_clears_selection() {
        let mut editor = Editor::default();
        let row = editor.append_from_palette(NodeKind::Row).expect("row");
        let column = editor
            .add_from_palette(NodeKind::Column, row.into(), 0)
            .expect("column");
        editor.select(column).expect("select");

        let removed = editor.remove_node(row).expect("remove");
        assert_eq!(removed, vec![row, column]);
        assert_eq!(editor.selection().selected(), None);
        assert!(editor.selected_node().is_none());
    }

    #[test]
    fn removing_dragged_subtree_cancels_the_drag() {
        let mut editor = Editor::default();
        let row = editor.append_from_palette(NodeKind::Row).expect("row");
        let column = editor
            .add_from_palette(NodeKind::Column, row.into(), 0)
            .expect("column");
        let field = editor.append_from_palette(NodeKind::TextField).expect("field");

        let source = DragSource::node(column);
        let _ = editor
            .handle_drag_event(&DragEvent::Start { active: source })
            .expect("start");
        assert_eq!(editor.session().phase(), DragPhase::Dragging);

        // Removing an unrelated node keeps the gesture alive.
        let _ = editor.remove_node(field).expect("remove field");
        assert_eq!(editor.session().phase(), DragPhase::Dragging);

        let _ = editor.remove_node(row).expect("remove ancestor");
        assert_eq!(editor.session().phase(), DragPhase::Idle);

        let next = DragSource::palette(NodeKind::Row);
        let transition = editor
            .handle_drag_event(&DragEvent::Start { active: next })
            .expect("start again");
        assert!(matches!(transition.effect, DragEffect::Started { .. }));
    }

    #[test]
    fn failed_palette_add_does_not_consume_an_id() {
        let mut editor = Editor::default();
        let row = editor.append_from_palette(NodeKind::Row).expect("row");
        let next = editor.tree().peek_next_id();
        assert!(matches!(
            editor.add_from_palette(NodeKind::TextField, row.into(), 0),
            Err(TreeError::KindRejected { .. })
        ));
        assert_eq!(editor.tree().peek_next_id(), next);
    }

    #[test]
    fn selected_attributes_are_patched() {
        let mut editor = Editor::default();
        let field = editor.append_from_palette(NodeKind::TextField).expect("field");
        assert_eq!(
            editor.update_selected_attributes(Attributes::new().with("label", "Name")),
            Ok(None)
        );
        editor
            .handle_canvas_event(CanvasEvent::NodeClicked { id: field })
            .expect("click");
        let changed = editor
            .update_selected_attributes(Attributes::new().with("required", true))
            .expect("patch");
        assert_eq!(changed, Some(vec!["required".to_string()]));
        assert_eq!(
            editor
                .selected_node()
                .and_then(|node| node.attributes().get("required")),
            Some(&json!(true))
        );
    }

    #[test]
    fn drop_indicator_follows_hover() {
        let mut editor = Editor::default();
        let column = editor.append_from_palette(NodeKind::Column).expect("column");
        let field = editor
            .add_from_palette(NodeKind::TextField, column.into(), 0)
            .expect("field");
        assert_eq!(editor.drop_indicator(), None);

        let source = DragSource::palette(NodeKind::SelectField);
        let _ = editor
            .handle_drag_event(&DragEvent::Start { active: source })
            .expect("start");
        let _ = editor
            .handle_drag_event(&DragEvent::Over {
                active: source,
                over: Some(DropTarget::node(field)),
                fraction: 0.1,
            })
            .expect("over");
        assert_eq!(
            editor.drop_indicator(),
            Some(DropIndicator {
                container: column.into(),
                index: 0,
                edge: DropEdge::Before(field),
            })
        );
    }

    #[test]
    fn load_snapshot_replaces_tree_and_resets_state() {
        let mut source = Editor::default();
        let row = source.append_from_palette(NodeKind::Row).expect("row");
        let snapshot = source.snapshot();

        let mut editor = Editor::default();
        let field = editor.append_from_palette(NodeKind::TextField).expect("field");
        editor.select(field).expect("select");
        editor.load_snapshot(snapshot.clone()).expect("load");

        assert_eq!(editor.snapshot(), snapshot);
        assert_eq!(editor.selection().selected(), None);
        assert_eq!(editor.tree().root_children(), &[row]);
    }
}
