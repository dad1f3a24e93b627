// src/identity.rs
// Anonymous visitor id, persisted locally so history follows the same user

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::Result;

/// `<data_dir>/copycat/visitor_id`, falling back to the working directory
pub fn default_visitor_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("copycat")
        .join("visitor_id")
}

/// Read the visitor id stored at `path`, creating one if missing or empty
pub fn visitor_id_at(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(existing) if !existing.trim().is_empty() => return Ok(existing.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let id = Uuid::new_v4().to_string();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &id)?;
    tracing::debug!(path = %path.display(), "Created visitor id");
    Ok(id)
}

/// Visitor id at the default location
pub fn visitor_id() -> Result<String> {
    visitor_id_at(&default_visitor_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_created_once_then_reused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("visitor_id");

        let first = visitor_id_at(&path).unwrap();
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(visitor_id_at(&path).unwrap(), first);
    }

    #[test]
    fn test_existing_value_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visitor_id");
        std::fs::write(&path, "  abc-123\n").unwrap();
        assert_eq!(visitor_id_at(&path).unwrap(), "abc-123");
    }

    #[test]
    fn test_empty_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visitor_id");
        std::fs::write(&path, "\n").unwrap();
        let id = visitor_id_at(&path).unwrap();
        assert!(!id.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), id);
    }
}
