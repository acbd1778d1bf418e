use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;
use walkdir::WalkDir;

/// A directory of notes and attachments, looked up the way wiki embeds are.
pub struct Vault {
    root: PathBuf,
}

#[derive(Debug)]
pub struct VaultFile {
    pub name: String,
    /// Lowercased, without the dot. Empty if there is none.
    pub extension: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `name` as a path relative to the vault first, then as a bare
    /// file name anywhere below it. Names that would leave the vault, either
    /// absolute or climbing through `..`, resolve to nothing.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            tracing::warn!(name, "embed points outside the vault");
            return None;
        }

        let direct = self.root.join(relative);
        if direct.is_file() {
            return Some(direct);
        }

        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .find(|e| e.file_type().is_file() && e.file_name().to_str() == Some(name))
            .map(|e| e.into_path())
    }

    pub fn read(&self, name: &str) -> Result<VaultFile, VaultError> {
        let path = self
            .locate(name)
            .ok_or_else(|| VaultError::NotFound(name.to_owned()))?;

        tracing::debug!(name, path = %path.display(), "vault file located");

        Ok(VaultFile {
            name: file_name(&path).unwrap_or(name).to_owned(),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .unwrap_or_default(),
            content: fs::read(&path)?,
        })
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}
