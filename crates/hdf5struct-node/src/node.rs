use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A fully materialized entry of an HDF5 file.
///
/// Groups map child names to child nodes, datasets are read into a [`Value`]. Materializing a
/// group preserves its key set exactly.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Node {
    Leaf(Value),
    Group(BTreeMap<String, Node>),
}

impl Node {
    pub fn empty_group() -> Self {
        Self::Group(BTreeMap::new())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Self::Leaf(v) => Some(v),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Group(children) => Some(children),
            Self::Leaf(_) => None,
        }
    }

    pub fn into_leaf(self) -> Option<Value> {
        match self {
            Self::Leaf(v) => Some(v),
            Self::Group(_) => None,
        }
    }

    /// Names of the immediate children, empty for a leaf
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.as_group()
            .into_iter()
            .flat_map(|children| children.keys().map(String::as_str))
    }

    /// Look up a descendant by a slash-delimited path relative to this node.
    ///
    /// Leading, trailing and repeated slashes are ignored, so `""` and `"/"` return `self`.
    pub fn get(&self, path: &str) -> Option<&Self> {
        path.split('/')
            .filter(|component| !component.is_empty())
            .try_fold(self, |node, component| node.as_group()?.get(component))
    }

    /// Shorthand for [`Node::get`] followed by [`Node::as_leaf`]
    pub fn leaf(&self, path: &str) -> Option<&Value> {
        self.get(path)?.as_leaf()
    }

    /// Total number of datasets in this subtree
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Group(children) => children.values().map(Self::leaf_count).sum(),
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let Self::Group(children) = self else {
            return Ok(());
        };
        for (name, child) in children {
            let indent = "  ".repeat(depth);
            match child {
                Self::Leaf(value) => writeln!(f, "{indent}{name}: {value}")?,
                Self::Group(_) => {
                    writeln!(f, "{indent}{name}/")?;
                    child.fmt_tree(f, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Self::Leaf(value)
    }
}

impl FromIterator<(String, Self)> for Node {
    fn from_iter<I: IntoIterator<Item = (String, Self)>>(iter: I) -> Self {
        Self::Group(iter.into_iter().collect())
    }
}

/// Renders groups as an indented tree, one entry per line
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(value) => writeln!(f, "{value}"),
            Self::Group(_) => self.fmt_tree(f, 0),
        }
    }
}
