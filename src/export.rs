//! Persistence collaborators for the emitted artifacts

use crate::error::{Result, XrayError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

/// Accepts a textual payload together with a suggested filename
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, payload: &str, filename: &str) -> Result<()>;
}

/// Writes each payload into a directory under its suggested name
#[derive(Debug, Clone)]
pub struct FileExporter {
    dir: PathBuf,
}

impl FileExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Exporter for FileExporter {
    async fn export(&self, payload: &str, filename: &str) -> Result<()> {
        let path = self.dir.join(filename);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, payload)
            .await
            .map_err(|e| XrayError::Export {
                target: path.display().to_string(),
                reason: e.to_string(),
            })?;
        log::info!("wrote {} bytes to {}", payload.len(), path.display());
        Ok(())
    }
}

/// Prints the payload on standard output; the filename is ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutExporter;

#[async_trait]
impl Exporter for StdoutExporter {
    async fn export(&self, payload: &str, _filename: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(payload.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// Keeps payloads in process, keyed by filename in export order
#[derive(Debug, Default)]
pub struct MemoryExporter {
    exports: Mutex<Vec<(String, String)>>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(filename, payload)` pairs exported so far
    pub fn exports(&self) -> Vec<(String, String)> {
        self.exports
            .lock()
            .map(|exports| exports.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Exporter for MemoryExporter {
    async fn export(&self, payload: &str, filename: &str) -> Result<()> {
        self.exports
            .lock()
            .map_err(|e| XrayError::Export {
                target: filename.to_string(),
                reason: e.to_string(),
            })?
            .push((filename.to_string(), payload.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_exporter_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path().join("out"));

        exporter.export("[]", "dom.json").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("out").join("dom.json")).unwrap();
        assert_eq!(written, "[]");
    }

    #[tokio::test]
    async fn test_memory_exporter_keeps_order() {
        let exporter = MemoryExporter::new();
        exporter.export("a", "first.json").await.unwrap();
        exporter.export("b", "second.json").await.unwrap();

        assert_eq!(
            exporter.exports(),
            vec![
                ("first.json".to_string(), "a".to_string()),
                ("second.json".to_string(), "b".to_string()),
            ]
        );
    }
}
