//! List command: what the vault holds for the watched paths

use colored::Colorize;
use snapfig_core::{Service, VaultEntry};

use crate::error::Result;

/// Run the list command
pub fn run_list(service: &mut impl Service, long: bool) -> Result<()> {
    service.reconstruct_watching()?;
    let entries = service.list_vault_entries()?;

    println!("{} {}", "Vault".bold(), service.vault_dir().as_str().dimmed());
    println!();
    if entries.is_empty() {
        println!(
            "  {} (use {} to take a snapshot)",
            "Empty".dimmed(),
            "snapfig copy".cyan()
        );
        return Ok(());
    }

    for line in render(&entries, long) {
        println!("{line}");
    }
    Ok(())
}

fn render(entries: &[VaultEntry], long: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in entries {
        if !entry.is_dir {
            lines.push(format!("  {}", entry.path.cyan()));
            continue;
        }

        let children: Vec<&str> = entry.visible_children().collect();
        lines.push(format!(
            "  {}/ {}",
            entry.path.cyan(),
            format!("({} items)", children.len()).dimmed()
        ));
        if long {
            for child in children {
                let rest = child
                    .strip_prefix(entry.path.as_str())
                    .unwrap_or(child)
                    .trim_start_matches('/');
                let depth = rest.matches('/').count();
                let name = rest.rsplit('/').next().unwrap_or(rest);
                lines.push(format!("    {}{}", "  ".repeat(depth), name));
            }
        }
    }
    lines
}
