//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based interactive selection.

use dialoguer::MultiSelect;
use snapfig_core::{NodeId, SelectionTree, VaultEntry};

use crate::error::Result;

/// Let the user pick what to restore from the vault contents.
///
/// Returns paths ready for a selective restore; a wholly chosen directory is
/// returned once rather than file by file.
pub fn pick_restore_paths(entries: &[VaultEntry]) -> Result<Vec<String>> {
    let mut tree = SelectionTree::from_vault_entries(&visible(entries));
    let order = display_order(&tree);
    let labels: Vec<String> = order.iter().map(|&id| label(&tree, id)).collect();

    let chosen = MultiSelect::new()
        .with_prompt("Select paths to restore (space to toggle, enter to confirm)")
        .items(&labels)
        .interact()?;

    Ok(apply_choices(&mut tree, &order, &chosen))
}

/// Entries with embedded git databases hidden from the picker.
fn visible(entries: &[VaultEntry]) -> Vec<VaultEntry> {
    entries
        .iter()
        .map(|entry| VaultEntry {
            path: entry.path.clone(),
            is_dir: entry.is_dir,
            children: entry.visible_children().map(str::to_string).collect(),
        })
        .collect()
}

/// Nodes in depth-first order, parents before their children.
fn display_order(tree: &SelectionTree) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(tree.len());
    let mut stack: Vec<NodeId> = tree.roots().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        order.push(id);
        stack.extend(tree.children(id).iter().rev().copied());
    }
    order
}

fn label(tree: &SelectionTree, id: NodeId) -> String {
    let indent = "  ".repeat(tree.depth(id));
    let suffix = if tree.is_dir(id) { "/" } else { "" };
    format!("{indent}{}{suffix}", tree.name(id))
}

/// Select every chosen row, then collapse the result.
fn apply_choices(tree: &mut SelectionTree, order: &[NodeId], chosen: &[usize]) -> Vec<String> {
    for &row in chosen {
        if let Some(&id) = order.get(row) {
            tree.set(id, true);
        }
    }
    tree.selected_paths()
}
