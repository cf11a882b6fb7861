// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Destinations for exported files

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives named file contents produced by an export
pub trait FileSink {
    /// Store `bytes` under `name`, returning where they ended up
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes files into a directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {:?}", self.dir))?;

        let path = self.dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("Failed to write file: {:?}", path))?;

        info!(path = %path.display(), bytes = bytes.len(), "saved file");
        Ok(path)
    }
}

/// Keeps saved files in memory, in save order
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl FileSink for MemorySink {
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.files.push((name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_sink_creates_dir() -> Result<()> {
        let temp = TempDir::new()?;
        let mut sink = DirectorySink::new(temp.path().join("nested/out"));

        let path = sink.save("output.stl", b"abc")?;

        assert_eq!(path, temp.path().join("nested/out/output.stl"));
        assert_eq!(fs::read(&path)?, b"abc");
        Ok(())
    }

    #[test]
    fn test_memory_sink_keeps_order() -> Result<()> {
        let mut sink = MemorySink::new();
        sink.save("b.stl", &[1])?;
        sink.save("a.stl", &[2])?;
        assert_eq!(sink.names(), vec!["b.stl", "a.stl"]);
        Ok(())
    }
}
