use covet_tree::Tree;

use crate::Config;

/// Parses `text` with line indexing and renders one row per source line:
/// line number, coverable marker, the kinds of the nodes on the line and the
/// line span they reach.
pub fn debug(text: &str, config: Config) -> String {
    render(&crate::parse(text, Config { lines: true, ..config }))
}

/// Renders an indexed tree; a tree parsed without line indexing renders empty.
pub fn render(tree: &Tree) -> String {
    let mut out = String::new();
    let Some(lines) = tree.lines() else { return out };

    for ((index, line), source) in lines.iter().enumerate().zip(tree.text().split('\n')) {
        let number = index + 1;
        let kinds = line.nodes.iter().map(|&id| tree[id].kind.abbr()).collect::<Vec<_>>().join(",");
        let stop = line
            .nodes
            .iter()
            .filter_map(|&id| tree[id].lines)
            .map(|lines| lines.stop + 1)
            .fold(number, usize::max);
        let marker = if line.coverable { '*' } else { ' ' };
        let span = format!("#{number} > #{stop}");

        out.push_str(&format!("#{number:<6}{marker}[{kinds:^19}] {span:<16}|{source}\n"));
    }

    out
}
