//! Inclusion forest: a record of what was included where.
//!
//! Each successfully processed directive becomes an [`InclusionNode`]; nested
//! directives become its children. Directives in a top-level document are
//! roots. Consumers use the forest for dependency tracking and tooling.

use crate::address::SourceAddress;
use crate::clipping::Clipping;
use crate::cycle::Site;
use crate::directive::{Directive, IncludeMode};

/// One processed directive.
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionNode {
    pub address: SourceAddress,
    pub mode: IncludeMode,
    pub clippings: Vec<Clipping>,
    pub site: Site,
    pub children: Vec<InclusionNode>,
}

impl InclusionNode {
    #[must_use]
    pub fn new(address: SourceAddress, directive: &Directive, site: Site) -> Self {
        Self {
            address,
            mode: directive.mode,
            clippings: directive.clippings.clone(),
            site,
            children: Vec::new(),
        }
    }
}

/// All inclusions of one composition pass, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InclusionForest {
    roots: Vec<InclusionNode>,
}

impl InclusionForest {
    #[must_use]
    pub fn roots(&self) -> &[InclusionNode] {
        &self.roots
    }

    /// Depth-first, pre-order traversal of every node.
    pub fn iter(&self) -> impl Iterator<Item = &InclusionNode> {
        Iter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Every distinct address, in first-seen order.
    #[must_use]
    pub fn addresses(&self) -> Vec<&SourceAddress> {
        let mut seen = std::collections::HashSet::new();
        self.iter()
            .map(|node| &node.address)
            .filter(|address| seen.insert(*address))
            .collect()
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

struct Iter<'a> {
    stack: Vec<&'a InclusionNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a InclusionNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Builds the forest as directives open and close.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    open: Vec<InclusionNode>,
    forest: InclusionForest,
}

impl TreeBuilder {
    pub(crate) fn open(&mut self, node: InclusionNode) {
        self.open.push(node);
    }

    /// Address of the innermost open node.
    pub(crate) fn current_address(&self) -> Option<&SourceAddress> {
        self.open.last().map(|node| &node.address)
    }

    /// Attach the innermost open node to its parent, or to the roots.
    pub(crate) fn close(&mut self) {
        let Some(node) = self.open.pop() else {
            return;
        };
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.forest.roots.push(node),
        }
    }

    /// Drop the innermost open node and everything under it.
    pub(crate) fn abandon(&mut self) {
        self.open.pop();
    }

    pub(crate) fn forest(&self) -> &InclusionForest {
        &self.forest
    }

    pub(crate) fn into_forest(self) -> InclusionForest {
        self.forest
    }
}
