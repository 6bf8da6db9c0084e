use crate::NodeId;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    /// Nodes with non-blank text on this line, in emission order.
    pub nodes: Vec<NodeId>,
    pub coverable: bool,
}

/// Per-line table, indexed by zero-based line number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lines {
    lines: Vec<Line>,
}

impl Lines {
    pub fn new(count: usize) -> Self {
        Self { lines: vec![Line::default(); count] }
    }

    pub fn get(&self, line: usize) -> Option<&Line> {
        self.lines.get(line)
    }

    pub fn get_mut(&mut self, line: usize) -> Option<&mut Line> {
        self.lines.get_mut(line)
    }

    pub fn push(&mut self, line: usize, node: NodeId) {
        if let Some(line) = self.lines.get_mut(line) {
            line.nodes.push(node);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.lines.iter_mut()
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Zero-based numbers of the coverable lines.
    pub fn coverable(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.iter().enumerate().filter(|(_, line)| line.coverable).map(|(index, _)| index)
    }
}
