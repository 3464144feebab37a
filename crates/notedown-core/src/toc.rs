use crate::registry::HeadingRecord;

/// A table-of-contents entry with the entries nested beneath it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TocNode {
    pub record: HeadingRecord,
    pub children: Vec<TocNode>,
}

impl TocNode {
    fn leaf(record: &HeadingRecord) -> Self {
        Self {
            record: record.clone(),
            children: Vec::new(),
        }
    }
}

/// Rebuilds the heading hierarchy from the flat registry. Top-level runs are
/// concatenated, so a registry that opens deeper than it continues (e.g. `h2, h1`)
/// still yields every heading exactly once.
pub fn build_toc(headings: &[HeadingRecord]) -> Vec<TocNode> {
    let mut out = Vec::new();
    let mut cursor = 0;
    while cursor < headings.len() {
        let (items, next) = build_level(headings, cursor);
        out.extend(items);
        cursor = next;
    }
    out
}

/// Collects siblings at `headings[start].level`, recursing into deeper runs and
/// stopping (without consuming) at the first shallower heading.
/// Returns the siblings and the index one past the consumed subtree.
fn build_level(headings: &[HeadingRecord], start: usize) -> (Vec<TocNode>, usize) {
    let level = headings[start].level;
    let mut items: Vec<TocNode> = Vec::new();
    let mut cursor = start;

    while cursor < headings.len() {
        let heading = &headings[cursor];
        if heading.level < level {
            break;
        }
        if heading.level == level {
            items.push(TocNode::leaf(heading));
            cursor += 1;
            continue;
        }
        let (children, next) = build_level(headings, cursor);
        match items.last_mut() {
            Some(parent) => parent.children.extend(children),
            None => items.extend(children),
        }
        cursor = next;
    }

    (items, cursor)
}
