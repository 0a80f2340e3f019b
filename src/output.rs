use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;

/// Writes `value` as pretty-printed JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<PathBuf> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents)?;
    info!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creates_parent_dirs_and_overwrites() {
        let dir = std::env::temp_dir().join(format!("simco-scrape-output-{}", std::process::id()));
        let path = dir.join("nested").join("out.json");

        write_json(&path, &json!({"a": [1, 2]})).unwrap();
        write_json(&path, &json!({"b": 1})).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"b\": 1\n}");

        fs::remove_dir_all(&dir).unwrap();
    }
}
