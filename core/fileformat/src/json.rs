use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::FileFormatError;
use crate::store::{FileFormatParameter, Registry};

/// Wire schema for one entry of a bulk-registration JSON file:
/// `{"<format name>": {"mime": "...", "extension": ["...", ...]}}`.
/// Unknown fields fail the whole file — registration is all-or-nothing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonEntry {
    mime: String,
    extension: Vec<String>,
}

/// Registers every file in `directory` with extension `ext` as a JSON
/// document of `{name: {mime, extension}}` entries. Any malformed file
/// aborts the whole call; entries already registered from earlier files
/// stay registered (only the failing file's batch is rejected).
pub fn register_from_json_path(
    registry: &Registry,
    directory: &Path,
    ext: &str,
) -> Result<usize, FileFormatError> {
    let mut registered = 0;
    let entries = std::fs::read_dir(directory).map_err(FileFormatError::Io)?;
    for entry in entries {
        let entry = entry.map_err(FileFormatError::Io)?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(FileFormatError::Io)?;
        let parsed: HashMap<String, JsonEntry> = serde_json::from_str(&text)
            .map_err(|e| FileFormatError::Schema(format!("{}: {e}", path.display())))?;

        for (name, entry) in parsed {
            let param = FileFormatParameter {
                name: name.clone(),
                mime: entry.mime,
            };
            registry.register(param, &entry.extension, None)?;
            registered += 1;
        }
    }
    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_well_formed_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("formats.json"),
            r#"{"wav": {"mime": "audio/wav", "extension": ["wav", "wave"]}}"#,
        )
        .unwrap();

        let registry = Registry::new();
        let count = register_from_json_path(&registry, dir.path(), "json").unwrap();
        assert_eq!(count, 1);
        assert_eq!(registry.get_ext("wave").unwrap().mime, "audio/wav");
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("formats.json"),
            r#"{"wav": {"mime": "audio/wav", "extension": ["wav"], "bogus": 1}}"#,
        )
        .unwrap();

        let registry = Registry::new();
        assert!(register_from_json_path(&registry, dir.path(), "json").is_err());
    }
}
