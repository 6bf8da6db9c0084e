use std::ops::Index;
use std::slice;

use text_size::{TextLen as _, TextRange, TextSize};

use crate::arena::Arena;
use crate::lines::Lines;
use crate::node::{Namespace, Node, NodeId, NodeKind};

/// Appends nodes to a tree while the parser walks the source.
pub struct Builder {
    text: Box<str>,
    nodes: Arena<Node>,
}

impl Builder {
    pub const ROOT: NodeId = NodeId::new(0);

    pub fn new(text: &str) -> Self {
        let mut nodes = Arena::new();
        nodes.alloc(Node {
            kind: NodeKind::File(Namespace::default()),
            text: TextRange::empty(TextSize::new(0)),
            close: TextRange::empty(text.text_len()),
            lines: None,
            coverable: false,
            in_php: false,
            has_methods: false,
            parent: None,
            namespace: Self::ROOT,
            function: None,
            children: Vec::new(),
        });

        Self { text: text.into(), nodes }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Appends a node as the last child of `parent`. Namespace and function
    /// nodes become their own `namespace`/`function`, everything else
    /// inherits them from the parent.
    pub fn attach(&mut self, parent: NodeId, kind: NodeKind, text: TextRange, in_php: bool) -> NodeId {
        let id = self.nodes.next_key();
        let parent_node = &self.nodes[parent];

        let namespace =
            if matches!(kind, NodeKind::Namespace(_)) { id } else { parent_node.namespace };
        let function =
            if matches!(kind, NodeKind::Function(_)) { Some(id) } else { parent_node.function };
        let has_methods = matches!(kind, NodeKind::Class(_) | NodeKind::Trait(_));

        self.nodes.alloc(Node {
            kind,
            text,
            close: TextRange::empty(text.end()),
            lines: None,
            coverable: false,
            in_php,
            has_methods,
            parent: Some(parent),
            namespace,
            function,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);

        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        &self.text[self.nodes[id].text]
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn finish(self, lines: Option<Lines>) -> Tree {
        Tree { text: self.text, nodes: self.nodes, lines }
    }
}

/// Immutable result of a parse: the source, its nodes and the optional line table.
#[derive(Debug, PartialEq, Eq)]
pub struct Tree {
    text: Box<str>,
    nodes: Arena<Node>,
    lines: Option<Lines>,
}

impl Tree {
    pub fn root(&self) -> NodeId {
        Builder::ROOT
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        &self.text[self.nodes[id].text]
    }

    pub fn close_text(&self, id: NodeId) -> &str {
        &self.text[self.nodes[id].close]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter_enumerated()
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn lines(&self) -> Option<&Lines> {
        self.lines.as_ref()
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |&id| self.nodes[id].parent)
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder::new(self, self.root())
    }

    /// Rebuilds the source by concatenating every node's text, its children
    /// and its closing text.
    pub fn unparse(&self) -> String {
        let mut out = String::with_capacity(self.text.len());

        for event in self.preorder() {
            match event {
                WalkEvent::Enter(id) => out.push_str(self.node_text(id)),
                WalkEvent::Leave(id) => out.push_str(self.close_text(id)),
            }
        }

        out
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkEvent {
    Enter(NodeId),
    Leave(NodeId),
}

/// Preorder traversal over nodes.
#[derive(Clone)]
pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeId, slice::Iter<'a, NodeId>)>,
    root: Option<NodeId>,
}

impl<'a> Preorder<'a> {
    fn new(tree: &'a Tree, start: NodeId) -> Self {
        Self { tree, stack: Vec::with_capacity(16), root: Some(start) }
    }

    /// Skips the subtree of the node that was just entered, including its `Leave` event.
    pub fn skip_subtree(&mut self) {
        self.stack.pop();
    }
}

impl Iterator for Preorder<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            self.stack.push((root, self.tree.children(root).iter()));
            return Some(WalkEvent::Enter(root));
        }

        let (_, children) = self.stack.last_mut()?;
        match children.next() {
            Some(&child) => {
                self.stack.push((child, self.tree.children(child).iter()));
                Some(WalkEvent::Enter(child))
            }
            None => self.stack.pop().map(|(exited, _)| WalkEvent::Leave(exited)),
        }
    }
}
