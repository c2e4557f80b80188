use std::collections::HashMap;

/// Opaque handle of a host layout node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placement {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

/// The computed style bits scroll-parent lookup needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeStyle {
    pub placement: Placement,
    pub overflow: Overflow,
    pub overflow_x: Overflow,
    pub overflow_y: Overflow,
}

impl NodeStyle {
    fn scrolls(&self, include_hidden: bool) -> bool {
        [self.overflow, self.overflow_x, self.overflow_y]
            .into_iter()
            .any(|o| match o {
                Overflow::Auto | Overflow::Scroll => true,
                Overflow::Hidden => include_hidden,
                Overflow::Visible => false,
            })
    }
}

/// Read access to the host's layout tree.
pub trait LayoutTree {
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn style(&self, node: NodeId) -> NodeStyle;
}

/// Memoized lookup of the nearest scrollable ancestor.
///
/// The memo belongs to one scroller and is cleared on its teardown; nodes are never shared
/// between instances.
#[derive(Clone, Debug, Default)]
pub struct ScrollParentCache {
    include_hidden: bool,
    memo: HashMap<NodeId, NodeId>,
}

impl ScrollParentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats `overflow: hidden` containers as scroll parents too.
    pub fn with_include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }

    /// Returns the nearest scrollable container of `node` (the node itself included).
    ///
    /// Fixed nodes have no scroll parent. Absolutely placed nodes skip static ancestors. Every
    /// node walked on the way to a hit is memoized; misses are not.
    pub fn find(&mut self, tree: &impl LayoutTree, node: NodeId) -> Option<NodeId> {
        if let Some(&hit) = self.memo.get(&node) {
            return Some(hit);
        }
        let placement = tree.style(node).placement;
        if placement == Placement::Fixed {
            return None;
        }
        let skip_static = placement == Placement::Absolute;

        let mut walked = Vec::new();
        let mut current = Some(node);
        while let Some(candidate) = current {
            walked.push(candidate);
            let style = tree.style(candidate);
            if skip_static && style.placement == Placement::Static {
                current = tree.parent(candidate);
                continue;
            }
            if let Some(&hit) = self.memo.get(&candidate) {
                return Some(hit);
            }
            if style.scrolls(self.include_hidden) {
                for n in walked {
                    self.memo.insert(n, candidate);
                }
                strace!(node = node.0, parent = candidate.0, "scroll parent resolved");
                return Some(candidate);
            }
            current = tree.parent(candidate);
        }
        None
    }
}
