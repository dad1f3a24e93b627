// src/cli/history.rs
// History commands, scoped to the local visitor id

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::HistoryAction;
use crate::history::NewHistoryEntry;
use crate::identity::{default_visitor_path, visitor_id_at};
use crate::remote::RemoteClient;

pub async fn run_history(server: &str, visitor_file: Option<PathBuf>, action: HistoryAction) -> Result<()> {
    let path = visitor_file.unwrap_or_else(default_visitor_path);
    let visitor_id = visitor_id_at(&path)
        .with_context(|| format!("failed to load visitor id from {}", path.display()))?;
    let client = RemoteClient::new(server);

    match action {
        HistoryAction::List { json } => {
            let entries = client.list_history(&visitor_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No history yet.");
            }
            for entry in entries {
                let kind = if entry.is_thread { "thread" } else { "tweet" };
                println!("{}  {}  [{} / {}]", entry.id, entry.created_at, kind, entry.mode);
                println!("  original: {}", entry.original_text);
                println!("  improved: {}", entry.improved_text);
            }
        }
        HistoryAction::Add {
            original,
            improved,
            thread,
            mode,
        } => {
            let entry = NewHistoryEntry {
                visitor_id,
                original_text: original,
                improved_text: improved,
                is_thread: thread,
                mode,
            };
            entry.validate()?;
            let id = client.add_history(&entry).await?;
            println!("Saved {}", id);
        }
        HistoryAction::Delete { id } => {
            client.delete_history(&id, &visitor_id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}
