/*!
parse/fault_catalogue.rs - Fault catalogue JSON loader.

Deserialises the §6 fault JSON schema into wire structs, then normalises
`category`/`cell_scope` strings into the domain enums and parses each
`fault_primitives` entry through [`crate::fault::parse_primitive`].
*/

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AtpgError;
use crate::fault::{CellScope, Category, Fault, parse_primitive};

#[derive(Debug, Deserialize)]
struct FaultEntryWire {
    fault_id: String,
    category: String,
    cell_scope: String,
    fault_primitives: Vec<String>,
}

/// Loads and normalises a fault catalogue from `path`. An entry whose
/// category/scope/primitive fails to parse produces an
/// `InputSyntax`/`InputSemantic` error naming the fault id and primitive
/// index, per §7's propagation policy.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Fault>, AtpgError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|e| AtpgError::syntax(&path_str, format!("failed to read file: {e}")))?;
    let entries: Vec<FaultEntryWire> = serde_json::from_str(&text)
        .map_err(|e| AtpgError::syntax(&path_str, format!("invalid JSON: {e}")))?;

    let mut faults = Vec::with_capacity(entries.len());
    for entry in entries {
        let category = Category::parse(&path_str, &entry.category)?;
        let cell_scope = CellScope::parse(&path_str, &entry.cell_scope)?;
        let mut primitives = Vec::with_capacity(entry.fault_primitives.len());
        for (idx, raw) in entry.fault_primitives.iter().enumerate() {
            let primitive = parse_primitive(&path_str, raw).map_err(|e| {
                AtpgError::syntax(&path_str, format!("fault '{}' primitive #{idx}: {e}", entry.fault_id))
            })?;
            primitives.push(primitive);
        }
        faults.push(Fault { id: entry.fault_id, category, cell_scope, primitives });
    }

    tracing::debug!(path = %path_str, entry_count = faults.len(), "loaded fault catalogue");
    Ok(faults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_well_formed_catalogue() {
        let dir = std::env::temp_dir();
        let path = dir.join("march_atpg_test_fault_catalogue.json");
        std::fs::write(
            &path,
            r#"[
                { "fault_id": "SA0", "category": "must_read", "cell_scope": "single cell",
                  "fault_primitives": ["<0-/1/->"] }
            ]"#,
        )
        .unwrap();

        let faults = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].id, "SA0");
        assert_eq!(faults[0].category, Category::MustRead);
        assert_eq!(faults[0].cell_scope, CellScope::SingleCell);
        assert_eq!(faults[0].primitives.len(), 1);
    }

    #[test]
    fn rejects_unknown_category() {
        let dir = std::env::temp_dir();
        let path = dir.join("march_atpg_test_fault_catalogue_bad.json");
        std::fs::write(
            &path,
            r#"[
                { "fault_id": "BAD", "category": "nonsense", "cell_scope": "single cell",
                  "fault_primitives": ["<0-/1/->"] }
            ]"#,
        )
        .unwrap();

        let result = load(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_a_syntax_error() {
        let result = load("/nonexistent/march_atpg_test_path.json");
        assert!(matches!(result, Err(AtpgError::InputSyntax { .. })));
    }
}
