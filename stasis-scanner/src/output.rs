use crate::error::{MirrorError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Root directory the mirror is written into.
///
/// Save names are host-relative (`/about/index.html`) and always resolve
/// below the root.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make sure the run starts from an empty root.
    ///
    /// A non-empty root is wiped when `force` is set and refused otherwise.
    pub fn prepare(&self, force: bool) -> Result<()> {
        if self.root.exists() && !self.is_empty()? {
            if !force {
                return Err(MirrorError::Config(format!(
                    "output directory {} is not empty (use --force to overwrite)",
                    self.root.display()
                )));
            }
            info!("Removing {}", self.root.display());
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn is_empty(&self) -> Result<bool> {
        match fs::read_dir(&self.root) {
            Ok(mut entries) => Ok(entries.next().is_none()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute location of `save_name`.
    pub fn resolve(&self, save_name: &str) -> Result<PathBuf> {
        let relative = Path::new(save_name.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(MirrorError::InvalidUrl(format!(
                "{} escapes the output directory",
                save_name
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Create `dir` and its parents; an existing directory is fine.
    pub fn ensure_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        Ok(())
    }

    pub fn write_bytes(&self, save_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.resolve(save_name)?;
        if let Some(parent) = target.parent() {
            self.ensure_dir(parent)?;
        }
        debug!("        -> Saving as: {}", target.display());
        fs::write(&target, bytes)?;
        Ok(target)
    }

    pub fn write_text(&self, save_name: &str, text: &str) -> Result<PathBuf> {
        self.write_bytes(save_name, text.as_bytes())
    }

    pub fn read_bytes(&self, save_name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(save_name)?)?)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        debug!("Renaming {} -> {}", source.display(), target.display());
        fs::rename(source, target)?;
        Ok(())
    }

    /// Every regular file below the root, in a stable order.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| MirrorError::Io(e.into()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
