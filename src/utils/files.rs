/// Scoped materialization of credential and manifest strings
use std::io::Write;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Write `content` to a private temporary file and return its handle.
///
/// The file is written exactly once and never mutated afterwards; the child
/// process only ever sees its path. Dropping the handle removes the file, on
/// success and failure paths alike.
pub fn materialize(label: &str, content: &str) -> Result<NamedTempFile> {
    let mut file =
        NamedTempFile::new().with_context(|| format!("failed to create {} file", label))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {} file", label))?;
    file.flush()
        .with_context(|| format!("failed to flush {} file", label))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_content_byte_for_byte() {
        let content = "apiVersion: v1\nkind: Config\nclusters: []\n";
        let file = materialize("kubeconfig", content).unwrap();

        let on_disk = std::fs::read(file.path()).unwrap();
        assert_eq!(on_disk, content.as_bytes());
    }

    #[test]
    fn file_is_removed_on_drop() {
        let file = materialize("manifest", "kind: Benchmark\n").unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn repeated_calls_use_distinct_files() {
        let first = materialize("kubeconfig", "one").unwrap();
        let second = materialize("kubeconfig", "two").unwrap();

        assert_ne!(first.path(), second.path());
    }
}
