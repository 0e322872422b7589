//! Canonical, ordered collection of nodes.
//!
//! Every successful mutation writes the whole list through to persistence.

use crate::persist::Persistence;
use crate::state::{
    Node, NodeStyle, Shape, DEFAULT_NODE_HEIGHT, DEFAULT_NODE_TEXT, DEFAULT_NODE_WIDTH,
    MIN_NODE_HEIGHT, MIN_NODE_WIDTH, PALETTE,
};

pub const ID_LEN: usize = 9;

/// Partial update. `None` leaves a field alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub text: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub shape: Option<Shape>,
    pub style: Option<NodeStyle>,
    pub is_editing: Option<bool>,
    pub manually_resized: Option<bool>,
}

impl NodePatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Everything a caller may choose when creating a node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewNode {
    pub x: f64,
    pub y: f64,
    pub text: Option<String>,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub shape: Shape,
    pub style: NodeStyle,
    /// Prefixed to the text as `"<emoji> <text>"`.
    pub emoji: Option<String>,
}

impl NewNode {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The committed text was blank, so the node is gone.
    Deleted,
    Unchanged,
    Updated,
}

pub struct NodeStore {
    nodes: Vec<Node>,
    persistence: Persistence,
}

impl NodeStore {
    /// Opens the store over whatever `persistence` already holds.
    pub fn open(persistence: Persistence) -> Self {
        let mut nodes = persistence.load();
        for node in &mut nodes {
            node.is_editing = false;
        }
        log::info!("loaded {} nodes", nodes.len());
        Self { nodes, persistence }
    }

    pub fn in_memory() -> Self {
        Self::open(Persistence::in_memory())
    }

    pub fn list(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.nodes.iter().find(|n| n.is_editing).map(|n| n.id.as_str())
    }

    /// Topmost node under a canvas-space point. Later nodes draw on top.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Node> {
        self.nodes.iter().rev().find(|n| n.contains_point(x, y))
    }

    pub fn create(&mut self, x: f64, y: f64, text: Option<&str>) -> String {
        self.create_with(NewNode {
            text: text.map(str::to_string),
            ..NewNode::at(x, y)
        })
    }

    pub fn create_with(&mut self, template: NewNode) -> String {
        let id = self.fresh_id();
        let base_text = template.text.unwrap_or_else(|| DEFAULT_NODE_TEXT.to_string());
        let text = match template.emoji.as_deref().map(str::trim) {
            Some(emoji) if !emoji.is_empty() => format!("{} {}", emoji, base_text),
            _ => base_text,
        };

        let mut node = Node::new(id.clone(), template.x, template.y, text);
        node.width = template.width.unwrap_or(DEFAULT_NODE_WIDTH).max(MIN_NODE_WIDTH);
        node.height = template.height.unwrap_or(DEFAULT_NODE_HEIGHT).max(MIN_NODE_HEIGHT);
        node.color = template.color.unwrap_or_else(random_color);
        node.shape = template.shape;
        node.style = template.style;

        log::info!("created node {} at ({:.0}, {:.0})", id, node.x, node.y);
        self.nodes.push(node);
        self.persist();
        id
    }

    /// Applies `patch` to node `id`. A changed text pushes the previous text
    /// onto the node's undo stack. Returns false if there is no such node.
    pub fn update(&mut self, id: &str, patch: NodePatch) -> bool {
        if !self.contains(id) {
            return false;
        }
        if patch.is_editing == Some(true) {
            for other in self.nodes.iter_mut().filter(|n| n.id != id) {
                other.is_editing = false;
            }
        }

        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if let Some(x) = patch.x {
            node.x = x;
        }
        if let Some(y) = patch.y {
            node.y = y;
        }
        if let Some(width) = patch.width {
            node.width = width.max(MIN_NODE_WIDTH);
        }
        if let Some(height) = patch.height {
            node.height = height.max(MIN_NODE_HEIGHT);
        }
        if let Some(text) = patch.text {
            if text != node.text {
                let previous = std::mem::replace(&mut node.text, text);
                node.history.push(previous);
            }
        }
        if let Some(color) = patch.color {
            node.color = color;
        }
        if let Some(text_color) = patch.text_color {
            node.text_color = Some(text_color);
        }
        if let Some(shape) = patch.shape {
            node.shape = shape;
        }
        if let Some(style) = patch.style {
            node.style = style;
        }
        if let Some(editing) = patch.is_editing {
            node.is_editing = editing;
        }
        if let Some(manual) = patch.manually_resized {
            node.manually_resized = manual;
        }
        self.persist();
        true
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        log::info!("deleted node {}", id);
        self.persist();
        true
    }

    /// Swaps in a whole collection (history restore, import).
    pub fn replace_all(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        self.persist();
    }

    /// Marks `id` as the only editing node. Any other node still in editing
    /// is committed with its current text first. Returns false if `id` is
    /// missing.
    pub fn set_editing(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        let others: Vec<(String, String)> = self
            .nodes
            .iter()
            .filter(|n| n.is_editing && n.id != id)
            .map(|n| (n.id.clone(), n.text.clone()))
            .collect();
        for (other_id, text) in others {
            self.commit_text(&other_id, &text);
        }
        self.update(
            id,
            NodePatch {
                is_editing: Some(true),
                ..NodePatch::default()
            },
        )
    }

    /// Ends editing on `id` with `text`. Blank text deletes the node;
    /// otherwise a changed text pushes the previous value onto the node's
    /// undo stack.
    pub fn commit_text(&mut self, id: &str, text: &str) -> CommitOutcome {
        if text.trim().is_empty() {
            self.delete(id);
            return CommitOutcome::Deleted;
        }
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return CommitOutcome::Unchanged;
        };
        node.is_editing = false;
        let outcome = if node.text == text {
            CommitOutcome::Unchanged
        } else {
            let previous = std::mem::replace(&mut node.text, text.to_string());
            node.history.push(previous);
            CommitOutcome::Updated
        };
        self.persist();
        outcome
    }

    /// Steps node `id` back one text revision. Returns false when there is
    /// nothing to undo.
    pub fn undo_text(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        let current = node.text.clone();
        match node.history.undo(current) {
            Some(previous) => {
                node.text = previous;
                self.persist();
                true
            }
            None => false,
        }
    }

    pub fn redo_text(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        let current = node.text.clone();
        match node.history.redo(current) {
            Some(next) => {
                node.text = next;
                self.persist();
                true
            }
            None => false,
        }
    }

    fn persist(&self) {
        self.persistence.save(&self.nodes);
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = random_id();
            if !self.contains(&id) {
                return id;
            }
            log::debug!("id {} already taken, drawing again", id);
        }
    }
}

/// Nine base-36 characters drawn from a v4 uuid.
pub fn random_id() -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut value = uuid::Uuid::new_v4().as_u128();
    let mut id = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        id.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    id
}

pub fn random_color() -> String {
    let byte = uuid::Uuid::new_v4().as_bytes()[0];
    PALETTE[byte as usize % PALETTE.len()].to_string()
}
