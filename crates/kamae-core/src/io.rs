//! File formats at the edges of a run: JSON-lines in, CSV out.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KamaeError, Result};

#[derive(Debug, Deserialize)]
struct TextLine {
    text: String,
}

/// Reads the `text` field of every non-blank line of a JSON-lines file.
///
/// Other fields are ignored. Errors carry the file path and 1-based line.
pub fn read_text_records(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| KamaeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut texts = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: TextLine = serde_json::from_str(line).map_err(|source| KamaeError::Json {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        texts.push(record.text);
    }

    tracing::info!(path = %path.display(), records = texts.len(), "read text records");
    Ok(texts)
}

/// Writes `rows` as CSV with a header derived from the row type.
pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    let csv_err = |source| KamaeError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| KamaeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), rows = rows.len(), "wrote CSV");
    Ok(())
}
