//! Node kind tags and layout axes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag identifying one type of building block.
///
/// The tag carries no behavior by itself; construction defaults and nesting
/// rules live in the kind registry of `pagecraft-tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    TextField,
    SelectField,
    Row,
    Column,
    Container,
}

impl NodeKind {
    /// Every kind, in palette order.
    pub const ALL: [Self; 5] = [
        Self::TextField,
        Self::SelectField,
        Self::Container,
        Self::Column,
        Self::Row,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextField => "text_field",
            Self::SelectField => "select_field",
            Self::Row => "row",
            Self::Column => "column",
            Self::Container => "container",
        }
    }

    /// Parse a kind tag, accepting both snake_case and the PascalCase names
    /// used by stored pages.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "text_field" | "TextField" => Some(Self::TextField),
            "select_field" | "SelectField" => Some(Self::SelectField),
            "row" | "Row" => Some(Self::Row),
            "column" | "Column" => Some(Self::Column),
            "container" | "Container" => Some(Self::Container),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction in which a container stacks its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAxis {
    /// Top to bottom; rim zones are the top and bottom bands.
    #[default]
    Vertical,
    /// Left to right; rim zones are the left and right bands.
    Horizontal,
}

impl LayoutAxis {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}
