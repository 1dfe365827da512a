use crate::common::{BinaryOperator, Span};
use crate::roll::{Eval, Outcome, RollContext, Roller};
use std::collections::TryReserveError;

/// Handle of a node inside its [`Tree`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch::enum_dispatch(Eval)]
pub enum Node {
    Number(Number),
    Neg(Neg),
    Binary(Binary),
    Dice(Dice),
}

impl Node {
    /// The literal value, if this is a number node.
    pub fn literal(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n.value),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Number {
    pub value: f64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Neg {
    pub operand: NodeId,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Binary {
    pub op: BinaryOperator,
    pub left: NodeId,
    pub right: NodeId,
}

/// `reps d sides`, both operands being arbitrary subtrees.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Dice {
    pub reps: NodeId,
    pub sides: NodeId,
}

/// A parsed dice expression.
///
/// Nodes live in one arena. A node only ever refers to nodes pushed before it,
/// so walking the arena front to back visits children before their parents.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    spans: Vec<Span>,
    root: NodeId,
}

impl Tree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The source range a node was parsed from.
    pub fn span(&self, id: NodeId) -> Span {
        self.spans[id.0].clone()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A lone number, whose trace would only repeat the result.
    pub fn is_trivial(&self) -> bool {
        matches!(self.nodes.as_slice(), [Node::Number(_)])
    }
}

/// Drops the tree held in `tree`, if any. Releasing twice is a no-op.
pub fn release(tree: &mut Option<Tree>) {
    if let Some(tree) = tree.take() {
        tracing::trace!(nodes = tree.len(), "releasing expression tree");
    }
}

/// Arena under construction; only the parser builds trees.
///
/// A failed allocation is remembered instead of returned, so the parser can
/// keep its shape; [`TreeBuilder::finish`] reports it.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<Node>,
    spans: Vec<Span>,
    failed: Option<TryReserveError>,
}

impl TreeBuilder {
    /// Appends a node. After an allocation failure the returned handle dangles.
    pub fn push(&mut self, node: Node, span: Span) -> NodeId {
        let reserved = self
            .nodes
            .try_reserve(1)
            .and_then(|()| self.spans.try_reserve(1));
        if let Err(err) = reserved {
            tracing::warn!(nodes = self.nodes.len(), "expression tree allocation failed");
            self.failed.get_or_insert(err);
            return NodeId(usize::MAX);
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.spans.push(span);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.spans.get(id.0).cloned().unwrap_or(0..0)
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        if let Some(slot) = self.spans.get_mut(id.0) {
            *slot = span;
        }
    }

    pub fn finish(self, root: NodeId) -> Result<Tree, TryReserveError> {
        match self.failed {
            Some(err) => Err(err),
            None => Ok(Tree {
                nodes: self.nodes,
                spans: self.spans,
                root,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial() {
        assert!(crate::parse("7").unwrap().is_trivial());
        assert!(crate::parse("(-7)").unwrap().is_trivial());
        assert!(!crate::parse("7 + 0").unwrap().is_trivial());
        assert!(!crate::parse("d7").unwrap().is_trivial());
    }

    #[test]
    fn test_children_precede_parents() {
        let tree = crate::parse("(1 + 2d(3 * 4)) % -(d6)").unwrap();
        for (i, node) in tree.nodes().iter().enumerate() {
            let children = match node {
                Node::Number(_) => vec![],
                Node::Neg(n) => vec![n.operand],
                Node::Binary(b) => vec![b.left, b.right],
                Node::Dice(d) => vec![d.reps, d.sides],
            };
            assert!(children.iter().all(|c| c.index() < i));
        }
        assert_eq!(tree.root().index(), tree.len() - 1);
    }

    #[test]
    fn test_release() {
        let mut tree = crate::parse("2d6").ok();
        release(&mut tree);
        assert!(tree.is_none());
        release(&mut tree);
        let mut absent: Option<Tree> = None;
        release(&mut absent);
        assert!(absent.is_none());
    }
}
