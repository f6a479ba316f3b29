//! Test specification lookup
//!
//! Resolves a graded source file to its registered test specification and a
//! module path to the specifications it contains.

use std::path::{Path, PathBuf};

use crate::models::{SpecEntry, SpecRegistry};

/// A source file under grading
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// File name including extension, e.g. `hello.py`
    pub file_name: String,
    /// Absolute directory containing the file
    pub dir: PathBuf,
    /// Absolute path of the file
    pub path: PathBuf,
}

/// Finds test specifications for source files
#[derive(Clone, Debug)]
pub struct Locator {
    registry: SpecRegistry,
    extension: String,
    cwd: PathBuf,
}

impl Locator {
    pub fn new(registry: SpecRegistry, extension: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        let extension = extension.into();
        Self {
            registry,
            extension: extension.trim_start_matches('.').to_string(),
            cwd: cwd.into(),
        }
    }

    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolve `target` (with or without extension) to an absolute source file
    pub fn source_file(&self, target: &str) -> SourceFile {
        let target = normalize(target);
        let target_path = Path::new(&target);

        let base = target_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| target.clone());
        let suffix = format!(".{}", self.extension);
        let file_name = if base.ends_with(&suffix) {
            base
        } else {
            format!("{base}{suffix}")
        };

        let dir = match target_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if parent.is_absolute() {
                    parent.to_path_buf()
                } else {
                    self.cwd.join(parent)
                }
            }
            _ => self.cwd.clone(),
        };

        SourceFile {
            path: dir.join(&file_name),
            file_name,
            dir,
        }
    }

    /// The specification for `file_name` under a module path containing `module`
    pub fn find_spec(&self, file_name: &str, module: &str) -> Option<&SpecEntry> {
        let suffix = format!(".{}", self.extension);
        let stem = file_name.strip_suffix(&suffix).unwrap_or(file_name);
        let module = normalize(module);

        self.registry
            .entries()
            .iter()
            .find(|e| e.name == stem && e.module.contains(module.as_str()))
    }

    /// Specifications of the first module path containing `module`.
    ///
    /// Every entry returned lives under that one module path. `None` when no
    /// module path matches; the list may be empty otherwise.
    pub fn module_specs(&self, module: &str) -> Option<Vec<&SpecEntry>> {
        let module = normalize(module);
        let matched = self
            .registry
            .modules()
            .into_iter()
            .find(|m| m.contains(module.as_str()))?;

        Some(
            self.registry
                .entries()
                .iter()
                .filter(|e| e.module == matched)
                .collect(),
        )
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}
