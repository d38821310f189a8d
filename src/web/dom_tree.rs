//! `TreeSurface` over a live `contenteditable` element
//!
//! Leaves are the element's DOM text nodes in document order; lengths come
//! from `CharacterData.length`, which is already in UTF-16 code units. A
//! marker is a `<span>` carrying only its numeric id.

use std::collections::HashMap;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node, Text};

use super::{MARKER_ATTR, MARKER_CLASS};
use crate::error::RenderError;
use crate::offsets::Located;
use crate::render::{MarkerId, TreeSurface};

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;

fn dom_err(e: JsValue) -> RenderError {
    RenderError::Dom(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

pub struct DomTree {
    document: Document,
    root: Element,
    markers: HashMap<MarkerId, Element>,
    /// Text nodes split apart by `wrap_range`, joined again on unwrap
    seams: Vec<(Text, Text)>,
}

impl DomTree {
    pub fn new(document: Document, root: Element) -> Self {
        Self {
            document,
            root,
            markers: HashMap::new(),
            seams: Vec::new(),
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Plain text exactly as the leaves count it
    pub fn text_content(&self) -> String {
        self.root.text_content().unwrap_or_default()
    }

    pub fn marker_text(&self, id: MarkerId) -> Option<String> {
        self.markers.get(&id).and_then(|el| el.text_content())
    }

    /// Forget markers whose node left the tree (e.g. replaced along with an
    /// enclosing marker)
    fn prune(&mut self) {
        let root: &Node = self.root.as_ref();
        self.markers.retain(|_, el| root.contains(Some(el.as_ref())));
    }

    fn take_marker(&mut self, id: MarkerId) -> Result<Element, RenderError> {
        self.markers.remove(&id).ok_or(RenderError::UnknownMarker(id))
    }

    fn split(&mut self, leaf: &Text, at: usize) -> Result<Text, RenderError> {
        let right = leaf.split_text(at as u32).map_err(dom_err)?;
        self.seams.push((leaf.clone(), right.clone()));
        Ok(right)
    }

    /// Join recorded seams whose halves sit next to each other again.
    /// Adjacent text nodes the page created itself are left alone.
    fn rejoin(&mut self) {
        loop {
            let ready = self.seams.iter().position(|(left, right)| {
                let right: &Node = right.as_ref();
                left.next_sibling().as_ref() == Some(right)
            });
            let Some(i) = ready else { break };
            let (left, right) = self.seams.remove(i);

            if left.append_data(&right.data()).is_err() {
                continue;
            }
            right.remove();
            for seam in self.seams.iter_mut() {
                if seam.0 == right {
                    seam.0 = left.clone();
                }
                if seam.1 == right {
                    seam.1 = left.clone();
                }
            }
        }

        let root: &Node = self.root.as_ref();
        self.seams.retain(|(left, right)| {
            left != right && root.contains(Some(left.as_ref())) && root.contains(Some(right.as_ref()))
        });
    }

    /// Point seams that touch a node inside `element` at `replacement`
    fn redirect_seams(&mut self, element: &Element, replacement: &Text) {
        let inside = |text: &Text| element.contains(Some(text.as_ref()));
        for seam in self.seams.iter_mut() {
            if inside(&seam.0) {
                seam.0 = replacement.clone();
            }
            if inside(&seam.1) {
                seam.1 = replacement.clone();
            }
        }
    }
}

impl TreeSurface for DomTree {
    type Leaf = Text;

    fn text_leaves(&self) -> Vec<(Text, usize)> {
        let mut leaves = Vec::new();
        let walker = match self.document.create_tree_walker_with_what_to_show(&self.root, SHOW_TEXT) {
            Ok(w) => w,
            Err(_) => return leaves,
        };
        while let Ok(Some(node)) = walker.next_node() {
            if let Ok(text) = node.dyn_into::<Text>() {
                let len = text.length() as usize;
                leaves.push((text, len));
            }
        }
        leaves
    }

    fn wrap_range(&mut self, range: &Located<Text>, marker: MarkerId) -> Result<(), RenderError> {
        let (start, end) = (&range.start, &range.end);

        // Split the leaves here rather than letting the Range do it, so the
        // seams are known and can be joined again later. The end goes first
        // so the start offset stays valid when both ends share a leaf.
        if end.offset < end.leaf.length() as usize {
            self.split(&end.leaf, end.offset)?;
        }
        let first = if start.offset > 0 {
            self.split(&start.leaf, start.offset)?
        } else {
            start.leaf.clone()
        };
        let last = if start.leaf == end.leaf { first.clone() } else { end.leaf.clone() };

        let span = self.document.create_element("span").map_err(dom_err)?;
        span.set_class_name(MARKER_CLASS);
        span.set_attribute(MARKER_ATTR, &marker.0.to_string())
            .map_err(dom_err)?;
        if let Some(html) = span.dyn_ref::<HtmlElement>() {
            let style = html.style();
            let _ = style.set_property("text-decoration", "underline wavy #ef4444");
            let _ = style.set_property("text-underline-offset", "3px");
        }

        // surroundContents throws when the range partially selects an element
        let surrounded = self.document.create_range().and_then(|dom_range| {
            dom_range.set_start_before(&first)?;
            dom_range.set_end_after(&last)?;
            dom_range.surround_contents(&span)
        });
        if surrounded.is_err() {
            self.rejoin();
            return Err(RenderError::CrossesBoundary);
        }
        self.markers.insert(marker, span);
        Ok(())
    }

    fn replace_marker(&mut self, marker: MarkerId, text: &str) -> Result<(), RenderError> {
        let element = self.take_marker(marker)?;
        let replacement = self.document.create_text_node(text);
        element.replace_with_with_node_1(&replacement).map_err(dom_err)?;
        self.redirect_seams(&element, &replacement);
        self.prune();
        self.rejoin();
        Ok(())
    }

    fn unwrap_marker(&mut self, marker: MarkerId) -> Result<(), RenderError> {
        let element = self.take_marker(marker)?;
        let parent = element
            .parent_node()
            .ok_or_else(|| RenderError::Dom("marker is detached".into()))?;
        while let Some(child) = element.first_child() {
            parent.insert_before(&child, Some(element.as_ref())).map_err(dom_err)?;
        }
        parent.remove_child(&element).map_err(dom_err)?;
        self.rejoin();
        Ok(())
    }
}
