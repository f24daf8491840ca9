//! Kind behavior table.
//!
//! Each [`NodeKind`] maps to a [`KindSpec`] holding its palette label, its
//! construction defaults, and, for containers, the layout axis and the set
//! of kinds it accepts as direct children. New behavior is added with
//! [`NodeRegistry::register`]; nothing is subclassed.
//!
//! A registry is shared behind an `Arc` once a [`crate::TreeStore`] is built
//! from it, so its answers stay fixed for the life of that tree.

use std::collections::{BTreeMap, BTreeSet};

use pagecraft_core::{Attributes, LayoutAxis, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::TreeError;
use crate::node::NodeInstance;

/// Nesting and layout rules for a container kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub axis: LayoutAxis,
    pub accepts: BTreeSet<NodeKind>,
}

impl ContainerSpec {
    #[must_use]
    pub fn new(axis: LayoutAxis, accepts: impl IntoIterator<Item = NodeKind>) -> Self {
        Self {
            axis,
            accepts: accepts.into_iter().collect(),
        }
    }
}

/// One row of the behavior table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSpec {
    pub kind: NodeKind,
    /// Palette button label.
    pub label: String,
    /// `None` for leaves.
    pub container: Option<ContainerSpec>,
    pub defaults: Attributes,
}

impl KindSpec {
    #[must_use]
    pub fn leaf(kind: NodeKind, label: impl Into<String>, defaults: Attributes) -> Self {
        Self {
            kind,
            label: label.into(),
            container: None,
            defaults,
        }
    }

    #[must_use]
    pub fn container(
        kind: NodeKind,
        label: impl Into<String>,
        container: ContainerSpec,
        defaults: Attributes,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            container: Some(container),
            defaults,
        }
    }

    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.container.is_some()
    }
}

/// The thing a child is placed into: the canvas root or a container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum ContainerKind {
    Root,
    Kind(NodeKind),
}

/// Palette button description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub kind: NodeKind,
    pub label: String,
    pub is_container: bool,
}

/// Kind catalog with nesting rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRegistry {
    kinds: BTreeMap<NodeKind, KindSpec>,
    root_accepts: BTreeSet<NodeKind>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl NodeRegistry {
    /// Registry with no kinds; the root accepts nothing until configured.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
            root_accepts: BTreeSet::new(),
        }
    }

    /// The builder's standard catalog.
    ///
    /// | Container | Accepts |
    /// |---|---|
    /// | root | every kind |
    /// | row (horizontal) | column |
    /// | column (vertical) | text field, select field |
    /// | container (vertical) | every kind |
    #[must_use]
    pub fn standard() -> Self {
        let field_defaults = Attributes::new()
            .with("label", "Text field")
            .with("helperText", "Helper text")
            .with("required", false)
            .with("placeholder", "Value here...");
        let select_defaults = field_defaults.clone().with("options", json!([]));

        let mut registry = Self::empty();
        let _ = registry.register(KindSpec::leaf(
            NodeKind::TextField,
            "Text Field",
            field_defaults,
        ));
        let _ = registry.register(KindSpec::leaf(
            NodeKind::SelectField,
            "Select Field",
            select_defaults,
        ));
        let _ = registry.register(KindSpec::container(
            NodeKind::Row,
            "Row",
            ContainerSpec::new(LayoutAxis::Horizontal, [NodeKind::Column]),
            Attributes::new().with("label", "Row"),
        ));
        let _ = registry.register(KindSpec::container(
            NodeKind::Column,
            "Column",
            ContainerSpec::new(
                LayoutAxis::Vertical,
                [NodeKind::TextField, NodeKind::SelectField],
            ),
            Attributes::new().with("label", "Column"),
        ));
        let _ = registry.register(KindSpec::container(
            NodeKind::Container,
            "Container",
            ContainerSpec::new(LayoutAxis::Vertical, NodeKind::ALL),
            Attributes::new().with("label", "Container"),
        ));
        registry.root_accepts = NodeKind::ALL.into_iter().collect();
        registry
    }

    /// Insert or replace the behavior entry for `spec.kind`.
    pub fn register(&mut self, spec: KindSpec) -> Option<KindSpec> {
        self.kinds.insert(spec.kind, spec)
    }

    /// Remove a kind; nodes of that kind can no longer be constructed.
    pub fn unregister(&mut self, kind: NodeKind) -> Option<KindSpec> {
        let _ = self.root_accepts.remove(&kind);
        self.kinds.remove(&kind)
    }

    /// Replace the set of kinds the canvas root accepts.
    pub fn set_root_accepts(&mut self, kinds: impl IntoIterator<Item = NodeKind>) {
        self.root_accepts = kinds.into_iter().collect();
    }

    #[must_use]
    pub fn spec(&self, kind: NodeKind) -> Option<&KindSpec> {
        self.kinds.get(&kind)
    }

    #[must_use]
    pub fn contains(&self, kind: NodeKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    #[must_use]
    pub fn is_container(&self, kind: NodeKind) -> bool {
        self.kinds.get(&kind).is_some_and(KindSpec::is_container)
    }

    /// Stacking axis of a container kind; `None` for leaves and unknown kinds.
    #[must_use]
    pub fn axis(&self, kind: NodeKind) -> Option<LayoutAxis> {
        self.kinds
            .get(&kind)
            .and_then(|spec| spec.container.as_ref())
            .map(|container| container.axis)
    }

    /// Registered kinds in id order.
    pub fn kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.kinds.keys().copied()
    }

    /// Registered kinds in palette order.
    #[must_use]
    pub fn palette(&self) -> Vec<PaletteEntry> {
        NodeKind::ALL
            .into_iter()
            .filter_map(|kind| self.kinds.get(&kind))
            .map(|spec| PaletteEntry {
                kind: spec.kind,
                label: spec.label.clone(),
                is_container: spec.is_container(),
            })
            .collect()
    }

    /// Whether `container` may hold `child` as a direct child.
    #[must_use]
    pub fn can_accept(&self, container: ContainerKind, child: NodeKind) -> bool {
        if !self.kinds.contains_key(&child) {
            return false;
        }
        match container {
            ContainerKind::Root => self.root_accepts.contains(&child),
            ContainerKind::Kind(kind) => self
                .kinds
                .get(&kind)
                .and_then(|spec| spec.container.as_ref())
                .is_some_and(|spec| spec.accepts.contains(&child)),
        }
    }

    /// Build a detached node with its own copy of the kind defaults.
    pub fn construct(&self, kind: NodeKind, id: NodeId) -> Result<NodeInstance, TreeError> {
        let spec = self
            .kinds
            .get(&kind)
            .ok_or(TreeError::UnknownKind { kind })?;
        Ok(NodeInstance::detached(id, kind, spec.defaults.clone()))
    }
}
