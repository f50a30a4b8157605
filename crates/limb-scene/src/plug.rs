//! Plugs: addresses of attributes, components and array elements

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of an attribute on a node
///
/// The attribute path may name a whole attribute (`translate`), one
/// component of a three-component attribute (`translateX`, `outColorR`) or
/// one element of an array attribute (`input1D[2]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plug {
    /// Owning node
    pub node: NodeId,
    /// Attribute path
    pub attr: String,
}

impl Plug {
    /// Create a plug
    #[must_use]
    pub fn new(node: NodeId, attr: impl Into<String>) -> Self {
        Self {
            node,
            attr: attr.into(),
        }
    }
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.attr)
    }
}

/// Interned attribute name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct AttrKey(pub(crate) u32);

/// Part of an attribute a plug addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Selector {
    Whole,
    Component(u8),
    Element(u32),
}

/// Resolved, hashable plug used as a dependency-graph vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PlugKey {
    pub(crate) node: NodeId,
    pub(crate) attr: AttrKey,
    pub(crate) selector: Selector,
}

impl PlugKey {
    pub(crate) fn whole(self) -> PlugKey {
        PlugKey {
            selector: Selector::Whole,
            ..self
        }
    }

    pub(crate) fn with(self, selector: Selector) -> PlugKey {
        PlugKey { selector, ..self }
    }
}

/// Split `name[3]` into `("name", Some(3))`
pub(crate) fn split_element(path: &str) -> Option<(&str, usize)> {
    let open = path.find('[')?;
    let inner = path.get(open + 1..)?.strip_suffix(']')?;
    let index = inner.parse().ok()?;
    Some((&path[..open], index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_paths_split() {
        assert_eq!(split_element("input1D[2]"), Some(("input1D", 2)));
        assert_eq!(split_element("input[0]"), Some(("input", 0)));
        assert_eq!(split_element("translate"), None);
        assert_eq!(split_element("input[x]"), None);
        assert_eq!(split_element("input[1"), None);
    }

    #[test]
    fn plug_display_uses_handle() {
        let plug = NodeId(4).plug("rotateZ");
        assert_eq!(plug.to_string(), "#4.rotateZ");
    }
}
