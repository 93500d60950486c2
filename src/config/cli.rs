use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::PathBuf;

/// Filesystem storage rooted at the configured output directory. Relative
/// artifact paths such as `tmp/001.txt` resolve against the root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(path))?)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let target = self.root.join(path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(target, data)?;
        Ok(())
    }
}
