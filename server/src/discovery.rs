//! File discovery collaborator (spec §6): walks a repository root and hands
//! back a language-tagged file list. Grounded in the teacher's
//! `ProjectFileDiscovery`, trimmed to what the core engines need — no
//! external-repo classification, no generated-doc filtering.

use crate::error::Result;
use crate::parser::Language;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub max_depth: Option<usize>,
    pub follow_links: bool,
    pub respect_gitignore: bool,
    pub max_files: Option<usize>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(15),
            follow_links: false,
            respect_gitignore: true,
            max_files: Some(50_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub language: Language,
}

pub struct ProjectFileDiscovery {
    root: PathBuf,
    config: DiscoveryConfig,
}

impl ProjectFileDiscovery {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: DiscoveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn discover_files(&self) -> Result<Vec<DiscoveredFile>> {
        debug!(root = %self.root.display(), "starting file discovery");

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .follow_links(self.config.follow_links)
            .git_ignore(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore);
        if let Some(depth) = self.config.max_depth {
            builder.max_depth(Some(depth));
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            let language = path
                .extension()
                .and_then(|e| e.to_str())
                .map(Language::from_extension)
                .unwrap_or(Language::Other);
            if matches!(language, Language::Other) {
                continue;
            }
            files.push(DiscoveredFile {
                path: path.to_path_buf(),
                language,
            });
            if let Some(max) = self.config.max_files {
                if files.len() >= max {
                    break;
                }
            }
        }

        debug!(count = files.len(), "file discovery complete");
        Ok(files)
    }
}

pub fn discover(root: &Path) -> Result<Vec<DiscoveredFile>> {
    ProjectFileDiscovery::new(root.to_path_buf()).discover_files()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovers_known_languages_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("README.md"), "hello").unwrap();
        let files = discover(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(matches!(files[0].language, Language::Rust));
    }
}
