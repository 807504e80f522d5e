//! Tri-state selection over vault contents for selective restore
//!
//! Nodes live in an arena addressed by [`NodeId`] with explicit parent and
//! child links. Selecting a node selects its whole subtree; every ancestor
//! is then recomputed as `Selected` or `Unselected` when its children agree
//! and `Mixed` when they don't.

use std::collections::HashMap;

use crate::sync::VaultEntry;

/// Index of a node in a [`SelectionTree`].
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Selected,
    Unselected,
    /// Some, but not all, descendants are selected
    Mixed,
}

#[derive(Debug, Clone)]
struct Node {
    path: String,
    name: String,
    is_dir: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    state: SelectionState,
}

/// Vault paths arranged as a tree of selectable nodes.
#[derive(Debug, Clone, Default)]
pub struct SelectionTree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    index: HashMap<String, NodeId>,
}

impl SelectionTree {
    /// Build an unselected tree: one root per entry, with its children
    /// nested by path.
    pub fn from_vault_entries(entries: &[VaultEntry]) -> Self {
        let mut tree = Self::default();

        for entry in entries {
            let root = tree.push(&entry.path, entry.path.clone(), entry.is_dir, None);
            tree.roots.push(root);

            for child in &entry.children {
                let (parent, name) = match child.rsplit_once('/') {
                    Some((parent_path, name)) => {
                        (tree.index.get(parent_path).copied().unwrap_or(root), name)
                    }
                    None => (root, child.as_str()),
                };
                tree.nodes[parent].is_dir = true;
                let id = tree.push(child, name.to_string(), false, Some(parent));
                tree.nodes[parent].children.push(id);
            }
        }

        tree
    }

    fn push(&mut self, path: &str, name: String, is_dir: bool, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            path: path.to_string(),
            name,
            is_dir,
            parent,
            children: Vec::new(),
            state: SelectionState::Unselected,
        });
        self.index.insert(path.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Vault-relative path of the node.
    pub fn path(&self, id: NodeId) -> &str {
        &self.nodes[id].path
    }

    /// Last path component; the full path for roots.
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id].name
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.nodes[id].is_dir
    }

    pub fn state(&self, id: NodeId) -> SelectionState {
        self.nodes[id].state
    }

    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// Nesting depth, 0 for roots.
    pub fn depth(&self, id: NodeId) -> usize {
        std::iter::successors(self.nodes[id].parent, |&p| self.nodes[p].parent).count()
    }

    /// Select a node that is not fully selected, otherwise clear it.
    pub fn toggle(&mut self, id: NodeId) {
        let selected = self.nodes[id].state != SelectionState::Selected;
        self.set(id, selected);
    }

    /// Set a node and its whole subtree, then recompute its ancestors.
    pub fn set(&mut self, id: NodeId, selected: bool) {
        let state = if selected {
            SelectionState::Selected
        } else {
            SelectionState::Unselected
        };

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.nodes[current].state = state;
            stack.extend(self.nodes[current].children.iter().copied());
        }

        let mut ancestor = self.nodes[id].parent;
        while let Some(current) = ancestor {
            self.nodes[current].state = self.combined_state(current);
            ancestor = self.nodes[current].parent;
        }
    }

    pub fn select_all(&mut self) {
        self.set_all(SelectionState::Selected);
    }

    pub fn clear(&mut self) {
        self.set_all(SelectionState::Unselected);
    }

    fn set_all(&mut self, state: SelectionState) {
        for node in &mut self.nodes {
            node.state = state;
        }
    }

    fn combined_state(&self, id: NodeId) -> SelectionState {
        let mut children = self.nodes[id].children.iter().map(|&c| self.nodes[c].state);
        let Some(first) = children.next() else {
            return self.nodes[id].state;
        };
        if first != SelectionState::Mixed && children.all(|state| state == first) {
            first
        } else {
            SelectionState::Mixed
        }
    }

    /// Paths to pass to selective restore.
    ///
    /// A fully selected node is emitted once and its descendants are implied;
    /// mixed nodes are descended into.
    pub fn selected_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            match node.state {
                SelectionState::Selected => paths.push(node.path.clone()),
                SelectionState::Mixed => stack.extend(node.children.iter().rev().copied()),
                SelectionState::Unselected => {}
            }
        }

        paths
    }
}
