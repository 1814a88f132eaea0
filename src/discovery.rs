//! Corpus discovery: walk a root directory and read every rule document.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Naming conventions that mark a file as a rule document.
pub const DEFAULT_PATTERNS: &[&str] = &["**/rules.md", "**/*-rules.md"];

/// Directory names never descended into.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "dist",
    "build",
    "out",
    "vendor",
    "venv",
    ".venv",
    "__pycache__",
    "coverage",
];

/// A raw document as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the corpus root, `/`-separated.
    pub path: String,
    pub raw_text: String,
}

pub struct Discovery {
    patterns: GlobSet,
    excludes: Vec<String>,
}

impl Discovery {
    /// Default conventions plus any extra glob patterns and excluded
    /// directory names.
    pub fn new(extra_patterns: &[String], extra_excludes: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_PATTERNS {
            builder.add(Glob::new(pattern)?);
        }
        for pattern in extra_patterns {
            builder.add(Glob::new(pattern)?);
        }

        let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        excludes.extend(extra_excludes.iter().cloned());

        Ok(Self {
            patterns: builder.build()?,
            excludes,
        })
    }

    /// Matching relative paths under `root`, in lexicographic order.
    /// A path reachable through several patterns appears once.
    pub fn paths(&self, root: &Path) -> Vec<String> {
        if !root.is_dir() {
            tracing::warn!("Rule root {} does not exist, corpus is empty", root.display());
            return Vec::new();
        }

        let excludes = self.excludes.clone();
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .parents(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false);
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let excluded = is_dir
                && entry.depth() > 0
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| excludes.iter().any(|e| e == name));
            if excluded {
                tracing::debug!("Skipping excluded directory {}", entry.path().display());
            }
            !excluded
        });

        let mut found = BTreeSet::new();
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let rel_str = relative.to_string_lossy().replace('\\', "/");
            if self.patterns.is_match(&rel_str) {
                found.insert(rel_str);
            }
        }

        found.into_iter().collect()
    }

    /// Read every discovered document. Unreadable files are logged and skipped.
    pub fn documents(&self, root: &Path) -> Vec<Document> {
        self.paths(root)
            .into_iter()
            .filter_map(|path| match fs::read_to_string(root.join(&path)) {
                Ok(raw_text) => Some(Document { path, raw_text }),
                Err(e) => {
                    tracing::warn!("Skipping {path}: {e}");
                    None
                }
            })
            .collect()
    }
}
