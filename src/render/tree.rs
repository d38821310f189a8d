//! TreePainter - marker painting for tree-structured surfaces
//!
//! Rich-text surfaces keep their text spread over many leaf nodes. Each
//! correction is resolved with `locate` against the current leaves and the
//! matched range is wrapped in a marker node directly in the tree.
//!
//! Corrections are painted back-to-front (descending start offset): wrapping
//! splits text leaves, and doing the rightmost range first keeps the flat
//! offsets of everything to its left unchanged within the same pass.
//!
//! `TreeSurface` abstracts the tree. `DocTree` is the in-memory
//! implementation; the browser build implements it over live DOM text nodes.

use super::markers::{Accepted, MarkerId, MarkerTable, PaintReport};
use crate::checker::{sort_descending, Correction};
use crate::console;
use crate::error::RenderError;
use crate::offsets::{len16, locate, Located, Utf16Index};

// =============================================================================
// Surface Abstraction
// =============================================================================

pub trait TreeSurface {
    type Leaf: Clone;

    /// Text leaves in document order with their UTF-16 lengths
    fn text_leaves(&self) -> Vec<(Self::Leaf, usize)>;

    /// Wrap the located range in a new marker node tagged with `marker`
    fn wrap_range(&mut self, range: &Located<Self::Leaf>, marker: MarkerId) -> Result<(), RenderError>;

    /// Replace the marker node (and everything inside it) with plain text
    fn replace_marker(&mut self, marker: MarkerId, text: &str) -> Result<(), RenderError>;

    /// Remove the marker node, keeping its children in place
    fn unwrap_marker(&mut self, marker: MarkerId) -> Result<(), RenderError>;
}

// =============================================================================
// TreePainter
// =============================================================================

pub struct TreePainter<S: TreeSurface> {
    surface: S,
    table: MarkerTable,
}

impl<S: TreeSurface> TreePainter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            table: MarkerTable::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.table
    }

    pub fn correction(&self, id: MarkerId) -> Option<&Correction> {
        self.table.get(id)
    }

    /// Unwrap any previous markers, then paint `corrections`.
    ///
    /// A correction that does not resolve (stale offsets, range crossing an
    /// element boundary) is skipped on its own; the rest of the batch still
    /// paints.
    pub fn paint(&mut self, mut corrections: Vec<Correction>) -> PaintReport {
        self.clear();
        sort_descending(&mut corrections);

        let mut report = PaintReport::default();
        for c in corrections {
            let leaves = self.surface.text_leaves();
            let Some(range) = locate(leaves, c.start_offset, c.end_offset) else {
                console::log(&format!(
                    "[TreePainter] {}..{} does not resolve, skipped",
                    c.start_offset, c.end_offset
                ));
                report.skipped += 1;
                continue;
            };

            let id = self.table.allocate();
            match self.surface.wrap_range(&range, id) {
                Ok(()) => {
                    self.table.insert_at(id, c);
                    report.painted += 1;
                }
                Err(e) => {
                    console::log(&format!("[TreePainter] wrap failed, skipped: {}", e));
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// Replace the marked text with its suggestion
    pub fn accept(&mut self, id: MarkerId) -> Result<Accepted, RenderError> {
        let correction = self
            .table
            .get(id)
            .cloned()
            .ok_or(RenderError::UnknownMarker(id))?;

        self.surface.replace_marker(id, &correction.suggested_text)?;
        self.table.remove(id);

        // Nested markers went away with the replaced node
        let dropped = self.table.apply_edit(
            correction.start_offset,
            correction.end_offset,
            &correction.suggested_text,
        );

        Ok(Accepted {
            marker: id,
            correction,
            dropped,
        })
    }

    /// Drop one marker without applying it, keeping its text
    pub fn unwrap(&mut self, id: MarkerId) -> Result<Correction, RenderError> {
        let correction = self.table.remove(id).ok_or(RenderError::UnknownMarker(id))?;
        self.surface.unwrap_marker(id)?;
        Ok(correction)
    }

    /// Unwrap every marker, restoring plain text. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let ids = self.table.clear();
        for id in &ids {
            if let Err(e) = self.surface.unwrap_marker(*id) {
                console::warn(&format!("[TreePainter] unwrap {} failed: {}", id, e));
            }
        }
        ids.len()
    }

    pub fn into_surface(mut self) -> S {
        self.clear();
        self.surface
    }
}

// =============================================================================
// DocTree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(String),
    Text(String),
    Marker(MarkerId),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree
///
/// Detached nodes stay in the arena but are unreachable from the root.
#[derive(Debug, Clone)]
pub struct DocTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// (left, right) text pairs produced by `split_text`; only these are
    /// joined again when a marker goes away
    seams: Vec<(NodeId, NodeId)>,
}

impl DocTree {
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Element(root_tag.to_string()),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            seams: Vec::new(),
        }
    }

    /// A root element holding one text child per fragment
    pub fn from_fragments(root_tag: &str, fragments: &[&str]) -> Self {
        let mut tree = Self::new(root_tag);
        let root = tree.root();
        for fragment in fragments {
            tree.append_text(root, fragment);
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.alloc(NodeKind::Element(tag.to_string()));
        self.attach(parent, self.children(parent).len(), id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text(text.to_string()));
        self.attach(parent, self.children(parent).len(), id);
        id
    }

    /// Concatenated text of the whole tree
    pub fn text_content(&self) -> String {
        self.text_of(self.root)
    }

    pub fn text_of(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// Markers reachable from the root, in document order
    pub fn markers(&self) -> Vec<MarkerId> {
        self.descendants(self.root)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                NodeKind::Marker(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Text inside the marker node tagged `id`
    pub fn marker_text(&self, id: MarkerId) -> Option<String> {
        self.find_marker(id).map(|n| self.text_of(n))
    }

    /// Number of nodes reachable from the root (root included)
    pub fn reachable_count(&self) -> usize {
        self.descendants(self.root).len()
    }

    /// Serialize as HTML-like markup, markers rendered as `<mark id=N>`
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(self.root, &mut out);
        out
    }

    // ---- internals ----

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
    }

    fn detach(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[child.0].parent.take()?;
        let index = self.index_in_parent(parent, child)?;
        self.nodes[parent.0].children.remove(index);
        Some((parent, index))
    }

    fn index_in_parent(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes[parent.0].children.iter().position(|&c| c == child)
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev());
        }
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(t) => out.push_str(t),
            _ => {
                for &child in &self.nodes[node.0].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element(tag) => {
                out.push_str(&format!("<{}>", tag));
                for &child in &self.nodes[node.0].children {
                    self.write_markup(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
            NodeKind::Marker(id) => {
                out.push_str(&format!("<mark id={}>", id.0));
                for &child in &self.nodes[node.0].children {
                    self.write_markup(child, out);
                }
                out.push_str("</mark>");
            }
        }
    }

    fn find_marker(&self, id: MarkerId) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.nodes[n.0].kind == NodeKind::Marker(id))
    }

    fn text_len(&self, node: NodeId) -> Result<usize, RenderError> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(t) => Ok(len16(t)),
            _ => Err(RenderError::Dom("not a text node".into())),
        }
    }

    /// Split a text node at a UTF-16 offset; the node keeps the prefix and a
    /// new sibling holding the suffix is inserted right after it
    fn split_text(&mut self, node: NodeId, at: usize) -> Result<NodeId, RenderError> {
        let NodeKind::Text(text) = &self.nodes[node.0].kind else {
            return Err(RenderError::Dom("not a text node".into()));
        };
        let byte = Utf16Index::new(text).to_byte(at)?;
        let suffix = text[byte..].to_string();
        let prefix = text[..byte].to_string();

        let parent = self.parent(node).ok_or(RenderError::Dom("detached text node".into()))?;
        let index = self
            .index_in_parent(parent, node)
            .ok_or(RenderError::Dom("broken parent link".into()))?;

        self.nodes[node.0].kind = NodeKind::Text(prefix);
        let right = self.alloc(NodeKind::Text(suffix));
        self.attach(parent, index + 1, right);
        self.seams.push((node, right));
        Ok(right)
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current == self.root
    }

    fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Text(_))
    }

    fn adjacent_text(&self, left: NodeId, right: NodeId) -> bool {
        if left == right || !self.is_text(left) || !self.is_text(right) {
            return false;
        }
        match (self.parent(left), self.parent(right)) {
            (Some(a), Some(b)) if a == b => {
                match (self.index_in_parent(a, left), self.index_in_parent(a, right)) {
                    (Some(l), Some(r)) => l + 1 == r,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Point seams that touch a node inside `subtree` at `replacement`
    fn redirect_seams(&mut self, subtree: NodeId, replacement: NodeId) {
        let inside = self.descendants(subtree);
        for (left, right) in self.seams.iter_mut() {
            if inside.contains(left) {
                *left = replacement;
            }
            if inside.contains(right) {
                *right = replacement;
            }
        }
    }

    /// Join every recorded seam whose two halves are adjacent text siblings
    /// again. Text nodes that were separate before painting stay separate.
    fn rejoin(&mut self) {
        loop {
            let ready = self
                .seams
                .iter()
                .position(|&(left, right)| self.adjacent_text(left, right));
            let Some(i) = ready else { break };
            let (left, right) = self.seams.remove(i);

            let NodeKind::Text(tail) = self.nodes[right.0].kind.clone() else { continue };
            if let NodeKind::Text(head) = &mut self.nodes[left.0].kind {
                head.push_str(&tail);
            }
            self.detach(right);
            for seam in self.seams.iter_mut() {
                if seam.0 == right {
                    seam.0 = left;
                }
                if seam.1 == right {
                    seam.1 = left;
                }
            }
        }

        let live: Vec<(NodeId, NodeId)> = self
            .seams
            .iter()
            .copied()
            .filter(|&(l, r)| l != r && self.is_attached(l) && self.is_attached(r))
            .collect();
        self.seams = live;
    }
}

impl TreeSurface for DocTree {
    type Leaf = NodeId;

    fn text_leaves(&self) -> Vec<(NodeId, usize)> {
        self.descendants(self.root)
            .into_iter()
            .filter_map(|n| match &self.nodes[n.0].kind {
                NodeKind::Text(t) => Some((n, len16(t))),
                _ => None,
            })
            .collect()
    }

    fn wrap_range(&mut self, range: &Located<NodeId>, marker: MarkerId) -> Result<(), RenderError> {
        let (start, end) = (&range.start, &range.end);
        let parent = self.parent(start.leaf).ok_or(RenderError::CrossesBoundary)?;
        if self.parent(end.leaf) != Some(parent) {
            return Err(RenderError::CrossesBoundary);
        }

        // Trim the end leaf first so the start offset stays valid when both
        // ends share a leaf
        if end.offset < self.text_len(end.leaf)? {
            self.split_text(end.leaf, end.offset)?;
        }
        let first = if start.offset > 0 {
            self.split_text(start.leaf, start.offset)?
        } else {
            start.leaf
        };

        let (Some(from), Some(to)) = (
            self.index_in_parent(parent, first),
            self.index_in_parent(parent, end.leaf),
        ) else {
            self.rejoin();
            return Err(RenderError::CrossesBoundary);
        };
        // `first` was split off the start leaf; when both ends share that leaf
        // the wrapped run is just `first`
        let to = if range.start.leaf == range.end.leaf { from } else { to };
        if to < from {
            self.rejoin();
            return Err(RenderError::CrossesBoundary);
        }

        let moved: Vec<NodeId> = self.nodes[parent.0].children.drain(from..=to).collect();
        let mark = self.alloc(NodeKind::Marker(marker));
        self.attach(parent, from, mark);
        for child in moved {
            self.nodes[child.0].parent = Some(mark);
            self.nodes[mark.0].children.push(child);
        }
        Ok(())
    }

    fn replace_marker(&mut self, marker: MarkerId, text: &str) -> Result<(), RenderError> {
        let node = self.find_marker(marker).ok_or(RenderError::UnknownMarker(marker))?;
        let (parent, index) = self.detach(node).ok_or(RenderError::UnknownMarker(marker))?;
        let replacement = self.alloc(NodeKind::Text(text.to_string()));
        self.attach(parent, index, replacement);
        self.redirect_seams(node, replacement);
        self.rejoin();
        Ok(())
    }

    fn unwrap_marker(&mut self, marker: MarkerId) -> Result<(), RenderError> {
        let node = self.find_marker(marker).ok_or(RenderError::UnknownMarker(marker))?;
        let (parent, index) = self.detach(node).ok_or(RenderError::UnknownMarker(marker))?;
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for (offset, child) in children.into_iter().enumerate() {
            self.attach(parent, index + offset, child);
        }
        self.rejoin();
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{CorrectionSource, GrammarChecker};
    use crate::offsets::slice16;

    fn painter_for(tree: DocTree) -> TreePainter<DocTree> {
        let text = tree.text_content();
        let mut painter = TreePainter::new(tree);
        let corrections = GrammarChecker::new().with_fallback(false).check(&text).unwrap();
        painter.paint(corrections);
        painter
    }

    fn assert_consistent(painter: &TreePainter<DocTree>) {
        let text = painter.surface().text_content();
        for (id, c) in painter.markers().iter() {
            assert_eq!(slice16(&text, c.start_offset, c.end_offset).unwrap(), c.original_text);
            assert_eq!(painter.surface().marker_text(id).unwrap(), c.original_text);
        }
    }

    #[test]
    fn test_paint_single_leaf() {
        let painter = painter_for(DocTree::from_fragments("div", &["I recieve teh package"]));
        assert_eq!(painter.markers().len(), 2);
        assert_eq!(
            painter.surface().to_markup(),
            "<div>I <mark id=1>recieve</mark> <mark id=0>teh</mark> package</div>"
        );
        assert_eq!(painter.surface().text_content(), "I recieve teh package");
        assert_consistent(&painter);
    }

    #[test]
    fn test_paint_across_sibling_leaves() {
        let painter = painter_for(DocTree::from_fragments("div", &["I rec", "ieve it"]));
        assert_eq!(painter.surface().to_markup(), "<div>I <mark id=0>recieve</mark> it</div>");
        assert_consistent(&painter);
    }

    #[test]
    fn test_paint_across_inline_element() {
        let mut tree = DocTree::new("div");
        let root = tree.root();
        tree.append_text(root, "I r");
        let b = tree.append_element(root, "b");
        tree.append_text(b, "eci");
        tree.append_text(root, "eve it");
        let painter = painter_for(tree);
        // The <b> sits fully inside the range, so it moves into the marker
        assert_eq!(
            painter.surface().to_markup(),
            "<div>I <mark id=0>r<b>eci</b>eve</mark> it</div>"
        );
    }

    #[test]
    fn test_range_crossing_element_boundary_is_skipped() {
        let mut tree = DocTree::new("div");
        let root = tree.root();
        let p1 = tree.append_element(root, "p");
        tree.append_text(p1, "I rec");
        let p2 = tree.append_element(root, "p");
        tree.append_text(p2, "ieve teh box");

        let text = tree.text_content();
        let mut painter = TreePainter::new(tree);
        let report = painter.paint(GrammarChecker::new().check(&text).unwrap());
        assert_eq!(report, PaintReport { painted: 1, skipped: 1 });
        assert_eq!(painter.surface().to_markup(), "<div><p>I rec</p><p>ieve <mark id=0>teh</mark> box</p></div>");
    }

    #[test]
    fn test_unresolvable_offsets_are_skipped() {
        let mut painter = TreePainter::new(DocTree::from_fragments("div", &["short"]));
        let report = painter.paint(vec![Correction {
            original_text: "far".into(),
            suggested_text: "near".into(),
            explanation: String::new(),
            start_offset: 10,
            end_offset: 13,
            origin: Default::default(),
        }]);
        assert_eq!(report, PaintReport { painted: 0, skipped: 1 });
        assert!(painter.surface().markers().is_empty());
    }

    #[test]
    fn test_accept_replaces_exactly_one_marker() {
        let mut painter = painter_for(DocTree::from_fragments("div", &["We recieve seperate teh boxes"]));
        assert_eq!(painter.markers().len(), 3);
        let (first, _) = painter.markers().by_position()[0];

        let accepted = painter.accept(first).unwrap();
        assert_eq!(accepted.correction.suggested_text, "receive");
        assert_eq!(painter.surface().text_content(), "We receive seperate teh boxes");
        assert_eq!(painter.markers().len(), 2);
        assert_eq!(painter.surface().markers().len(), 2);
        assert_consistent(&painter);
    }

    #[test]
    fn test_accept_longer_suggestion_keeps_later_offsets() {
        let mut painter = painter_for(DocTree::from_fragments("div", &["teh accomodate teh"]));
        let (first, _) = painter.markers().by_position()[0];
        painter.accept(first).unwrap();
        let (next, _) = painter.markers().by_position()[0];
        painter.accept(next).unwrap();
        assert_eq!(painter.surface().text_content(), "the accommodate teh");
        assert_consistent(&painter);
    }

    fn nested_painter() -> TreePainter<DocTree> {
        let inner = Correction {
            original_text: "teh".into(),
            suggested_text: "the".into(),
            explanation: String::new(),
            start_offset: 4,
            end_offset: 7,
            origin: Default::default(),
        };
        let outer = Correction {
            original_text: "its teh end".into(),
            suggested_text: "It's the end".into(),
            start_offset: 0,
            end_offset: 11,
            ..inner.clone()
        };
        let mut painter = TreePainter::new(DocTree::from_fragments("div", &["its teh end"]));
        painter.paint(vec![outer, inner]);
        painter
    }

    #[test]
    fn test_overlap_ending_inside_marker_is_skipped() {
        // "its teh" ends inside the "teh" marker painted before it
        let mut painter = TreePainter::new(DocTree::from_fragments("div", &["its teh end"]));
        let report = painter.paint(GrammarChecker::new().check("its teh end").unwrap());
        assert_eq!(report, PaintReport { painted: 1, skipped: 1 });
        assert_eq!(painter.surface().to_markup(), "<div>its <mark id=0>teh</mark> end</div>");
    }

    #[test]
    fn test_enclosing_range_wraps_existing_marker() {
        let painter = nested_painter();
        assert_eq!(
            painter.surface().to_markup(),
            "<div><mark id=1>its <mark id=0>teh</mark> end</mark></div>"
        );
        assert_consistent(&painter);
    }

    #[test]
    fn test_accept_inner_of_nested_markers() {
        let mut painter = nested_painter();
        painter.accept(MarkerId(0)).unwrap();
        assert_eq!(painter.surface().text_content(), "its the end");
        let outer = painter.correction(MarkerId(1)).unwrap();
        assert_eq!(outer.original_text, "its the end");
        assert_consistent(&painter);
    }

    #[test]
    fn test_accept_outer_drops_nested() {
        let mut painter = nested_painter();
        let accepted = painter.accept(MarkerId(1)).unwrap();
        assert_eq!(accepted.dropped, vec![MarkerId(0)]);
        assert_eq!(painter.surface().text_content(), "It's the end");
        assert!(painter.markers().is_empty());
        assert!(painter.surface().markers().is_empty());
    }

    #[test]
    fn test_clear_restores_original_structure() {
        let mut tree = DocTree::new("div");
        let root = tree.root();
        tree.append_text(root, "I recieve ");
        let b = tree.append_element(root, "b");
        tree.append_text(b, "teh");
        tree.append_text(root, " package");
        let before = tree.to_markup();
        let nodes_before = tree.reachable_count();

        let mut painter = painter_for(tree);
        assert_eq!(painter.markers().len(), 2);
        assert_eq!(painter.clear(), 2);

        assert!(painter.markers().is_empty());
        assert!(painter.surface().markers().is_empty());
        assert_eq!(painter.surface().to_markup(), before);
        assert_eq!(painter.surface().reachable_count(), nodes_before);
    }

    #[test]
    fn test_clear_keeps_page_owned_adjacent_text_nodes() {
        // Two text nodes the page created itself; the marker covers the
        // second one whole so nothing gets split
        let tree = DocTree::from_fragments("div", &["hello ", "teh"]);
        let nodes_before = tree.reachable_count();
        assert_eq!(nodes_before, 3);

        let mut painter = painter_for(tree);
        assert_eq!(painter.markers().len(), 1);
        painter.clear();

        let root = painter.surface().root();
        assert_eq!(painter.surface().reachable_count(), nodes_before);
        assert_eq!(painter.surface().children(root).len(), 2);
        assert_eq!(painter.surface().to_markup(), "<div>hello teh</div>");
    }

    #[test]
    fn test_clear_rejoins_only_its_own_splits() {
        let tree = DocTree::from_fragments("div", &["a ", "b teh c", " d"]);
        let mut painter = painter_for(tree);
        // "b teh c" was split around the marker
        assert_eq!(painter.surface().children(painter.surface().root()).len(), 5);

        painter.clear();
        let surface = painter.surface();
        let texts: Vec<String> = surface
            .children(surface.root())
            .iter()
            .map(|&n| surface.text_of(n))
            .collect();
        assert_eq!(texts, vec!["a ", "b teh c", " d"]);
    }

    #[test]
    fn test_accept_joins_replacement_with_split_neighbours() {
        let tree = DocTree::from_fragments("div", &["x ", "so teh end"]);
        let mut painter = painter_for(tree);
        let (id, _) = painter.markers().by_position()[0];
        painter.accept(id).unwrap();

        let surface = painter.surface();
        let texts: Vec<String> = surface
            .children(surface.root())
            .iter()
            .map(|&n| surface.text_of(n))
            .collect();
        assert_eq!(texts, vec!["x ", "so the end"]);
    }

    #[test]
    fn test_unwrap_single_marker_keeps_text() {
        let mut painter = painter_for(DocTree::from_fragments("div", &["teh recieve"]));
        let (first, _) = painter.markers().by_position()[0];
        let dropped = painter.unwrap(first).unwrap();
        assert_eq!(dropped.original_text, "teh");
        assert_eq!(painter.surface().text_content(), "teh recieve");
        assert_eq!(painter.markers().len(), 1);
        assert_eq!(painter.surface().markers().len(), 1);
        assert_eq!(painter.unwrap(first), Err(RenderError::UnknownMarker(first)));
    }

    #[test]
    fn test_repaint_replaces_previous_markers() {
        let mut painter = painter_for(DocTree::from_fragments("div", &["teh teh"]));
        let text = painter.surface().text_content();
        painter.paint(GrammarChecker::new().check(&text).unwrap());
        assert_eq!(painter.markers().len(), 2);
        assert_eq!(painter.surface().markers().len(), 2);
    }

    #[test]
    fn test_into_surface_unwraps() {
        let painter = painter_for(DocTree::from_fragments("div", &["teh"]));
        let tree = painter.into_surface();
        assert_eq!(tree.to_markup(), "<div>teh</div>");
    }

    #[test]
    fn test_utf16_offsets_in_tree() {
        let painter = painter_for(DocTree::from_fragments("div", &["😀 te", "h!"]));
        assert_eq!(painter.surface().to_markup(), "<div>😀 <mark id=0>teh</mark>!</div>");
    }
}
