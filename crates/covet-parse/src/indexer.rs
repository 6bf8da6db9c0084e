use covet_tree::{Builder, LineRange, Lines, NodeId};

/// Assigns nodes to the lines they span as the parser emits them.
pub(crate) struct LineIndexer {
    /// Zero-based line the next emitted text starts on.
    line: usize,
    lines: Lines,
}

impl LineIndexer {
    pub(crate) fn new(text: &str) -> Self {
        Self { line: 0, lines: Lines::new(text.matches('\n').count() + 1) }
    }

    /// Records `id` on every line its text touches with non-blank content and
    /// extends the parent's span to the node's last non-blank line.
    pub(crate) fn assign(&mut self, builder: &mut Builder, id: NodeId) {
        let first = self.line;
        let mut last_blank = false;

        for (offset, segment) in builder.node_text(id).split('\n').enumerate() {
            last_blank = segment.trim().is_empty();
            if !last_blank {
                self.lines.push(first + offset, id);
            }
            self.line = first + offset;
        }

        builder.node_mut(id).lines = Some(LineRange { start: first, stop: self.line });

        let stop = if last_blank { self.line.saturating_sub(1) } else { self.line };
        stamp_parent(builder, id, stop);
    }

    /// Accounts for a scope's closing text and stamps the current line as
    /// the end of the scope and of its parent.
    pub(crate) fn close(&mut self, builder: &mut Builder, id: NodeId) {
        let close = builder.node(id).close;
        self.line += builder.text()[close].matches('\n').count();

        builder.node_mut(id).lines.get_or_insert_with(LineRange::default).stop = self.line;
        stamp_parent(builder, id, self.line);
    }

    /// A line is coverable when a coverable node ends on it.
    pub(crate) fn finish(mut self, builder: &Builder) -> Lines {
        for (index, line) in self.lines.iter_mut().enumerate() {
            line.coverable = line.nodes.iter().any(|&id| {
                let node = builder.node(id);
                node.coverable && node.lines.is_some_and(|lines| lines.stop == index)
            });
        }

        self.lines
    }
}

fn stamp_parent(builder: &mut Builder, id: NodeId, stop: usize) {
    if let Some(parent) = builder.node(id).parent {
        builder.node_mut(parent).lines.get_or_insert_with(LineRange::default).stop = stop;
    }
}

#[cfg(test)]
mod tests {
    use covet_tree::NodeKind;
    use text_size::TextRange;

    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn multi_line_node_ends_on_its_last_line() {
        let text = "$a =\n  1;\n\n";
        let mut builder = Builder::new(text);
        let mut indexer = LineIndexer::new(text);

        let statement = builder.attach(Builder::ROOT, NodeKind::Code, range(0, 9), true);
        builder.node_mut(statement).coverable = true;
        indexer.assign(&mut builder, statement);

        let blank = builder.attach(Builder::ROOT, NodeKind::Code, range(9, 11), true);
        indexer.assign(&mut builder, blank);

        assert_eq!(builder.node(statement).lines, Some(LineRange { start: 0, stop: 1 }));
        assert_eq!(builder.node(blank).lines, Some(LineRange { start: 1, stop: 3 }));
        assert_eq!(builder.node(Builder::ROOT).lines, Some(LineRange { start: 0, stop: 2 }));

        let lines = indexer.finish(&builder);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.get(0).map(|line| line.nodes.clone()), Some(vec![statement]));
        assert_eq!(lines.get(1).map(|line| line.nodes.clone()), Some(vec![statement]));
        assert_eq!(lines.coverable().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn close_counts_newlines_of_closing_text() {
        let text = "f(function() {\n}\n);";
        let mut builder = Builder::new(text);
        let mut indexer = LineIndexer::new(text);

        let head = builder.attach(Builder::ROOT, NodeKind::Code, range(0, 2), true);
        indexer.assign(&mut builder, head);
        let function =
            builder.attach(Builder::ROOT, NodeKind::Function(Default::default()), range(2, 14), true);
        indexer.assign(&mut builder, function);
        builder.node_mut(function).close = range(14, 19);
        indexer.close(&mut builder, function);

        assert_eq!(builder.node(function).lines, Some(LineRange { start: 0, stop: 2 }));
        assert_eq!(builder.node(Builder::ROOT).lines.map(|lines| lines.stop), Some(2));
    }
}
