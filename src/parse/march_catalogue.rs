/*!
parse/march_catalogue.rs - March test catalogue JSON loader.

Deserialises `{March_test, Pattern}` pairs and runs each pattern string
through [`crate::march::MarchTest::parse_pattern`].
*/

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AtpgError;
use crate::march::MarchTest;

#[derive(Debug, Deserialize)]
struct MarchEntryWire {
    #[serde(rename = "March_test")]
    march_test: String,
    #[serde(rename = "Pattern")]
    pattern: String,
}

/// Loads a March test catalogue from `path`, returning `(name, MarchTest)`
/// pairs in document order.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<(String, MarchTest)>, AtpgError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|e| AtpgError::syntax(&path_str, format!("failed to read file: {e}")))?;
    let entries: Vec<MarchEntryWire> = serde_json::from_str(&text)
        .map_err(|e| AtpgError::syntax(&path_str, format!("invalid JSON: {e}")))?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let mt = MarchTest::parse_pattern(&path_str, &entry.march_test, &entry.pattern)?;
        out.push((entry.march_test, mt));
    }

    tracing::debug!(path = %path_str, entry_count = out.len(), "loaded march catalogue");
    Ok(out)
}
