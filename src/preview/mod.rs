// File tree previews for the dashboard detail views
pub mod sanitize;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::preview::sanitize::PathBoundary;

/// Largest single file inlined into a preview
pub const MAX_FILE_PREVIEW_BYTES: u64 = 1024 * 1024; // 1MB
/// Largest amount of content inlined across one whole listing
pub const MAX_TOTAL_PREVIEW_BYTES: u64 = 50 * 1024 * 1024; // 50MB
/// Largest number of files enumerated in one listing
pub const MAX_PREVIEW_FILES: usize = 1000;

/// Reserved listing key flagging that the file-count cap was hit.
/// Real entries are always relative paths, so they can never collide with it.
pub const LIMIT_EXCEEDED_KEY: &str = "_limit_exceeded";

const TOTAL_LIMIT_PLACEHOLDER: &str = "[Total preview size limit exceeded]";

/// Extensions inlined as text under the dataset policy
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "csv", "json", "md", "py", "yml", "yaml", "xml", "log", "tsv",
];

/// Directory components dropped from code listings. Tooling output, caches
/// and vendored dependencies never belong in a code review.
const IGNORED_COMPONENTS: &[&str] = &[
    ".venv",
    "venv",
    "__pycache__",
    ".git",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    "node_modules",
    ".tox",
    ".eggs",
    ".coverage",
    "htmlcov",
    "dist",
    "build",
    ".DS_Store",
];

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("cannot resolve preview root {dir}: {source}")]
    Root {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk {dir}: {source}")]
    Walk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// One scanned tree: the root that was walked plus a map of slash-separated
/// relative paths to file contents or bracketed placeholders.
#[derive(Debug, Clone)]
pub struct TreePreview {
    pub dir: PathBuf,
    pub files: BTreeMap<String, String>,
}

/// Walks a directory tree and inlines file contents under byte and count
/// budgets. Two policies exist: `dataset` previews only known text formats
/// and labels the rest, `code` inlines everything but skips tooling
/// directories.
#[derive(Debug, Clone)]
pub struct PreviewBuilder {
    max_file_bytes: u64,
    max_total_bytes: u64,
    max_files: usize,
    text_only: bool,
    skip_tool_dirs: bool,
    /// Noun naming the scanned tree in the file-count cap message
    subject: &'static str,
}

impl PreviewBuilder {
    /// Policy for dataset trees: known text extensions inline, everything
    /// else is labelled as binary
    pub fn dataset() -> Self {
        Self {
            max_file_bytes: MAX_FILE_PREVIEW_BYTES,
            max_total_bytes: MAX_TOTAL_PREVIEW_BYTES,
            max_files: MAX_PREVIEW_FILES,
            text_only: true,
            skip_tool_dirs: false,
            subject: "Dataset",
        }
    }

    /// Policy for submitted code trees: every file inlines as text so nothing
    /// reviewable can hide behind an unknown extension
    pub fn code() -> Self {
        Self {
            max_file_bytes: MAX_FILE_PREVIEW_BYTES,
            max_total_bytes: MAX_TOTAL_PREVIEW_BYTES,
            max_files: MAX_PREVIEW_FILES,
            text_only: false,
            skip_tool_dirs: true,
            subject: "Job",
        }
    }

    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn max_total_bytes(mut self, max_total_bytes: u64) -> Self {
        self.max_total_bytes = max_total_bytes;
        self
    }

    /// Walk `root` and build the preview listing.
    ///
    /// A missing root yields an empty listing rather than an error; per-file
    /// problems (unreadable entries, paths resolving outside the root) are
    /// skipped or labelled in place. Only an unwalkable tree fails the scan.
    pub fn scan(&self, root: &Path) -> Result<TreePreview, PreviewError> {
        let mut files = BTreeMap::new();
        if !root.is_dir() {
            warn!("preview root does not exist: {}", root.display());
            return Ok(TreePreview {
                dir: root.to_path_buf(),
                files,
            });
        }

        let boundary = PathBoundary::new(root).map_err(|source| PreviewError::Root {
            dir: root.to_path_buf(),
            source,
        })?;

        let mut total_bytes: u64 = 0;
        let mut seen: usize = 0;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| PreviewError::Walk {
                dir: root.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            if self.skip_tool_dirs && is_tooling_path(rel) {
                continue;
            }
            let Some(resolved) = boundary.resolve(entry.path()) else {
                warn!("skipping path outside preview root: {}", entry.path().display());
                continue;
            };
            if resolved.is_dir() {
                // Symlink to a directory, nothing to inline
                continue;
            }

            seen += 1;
            if seen > self.max_files {
                files.insert(
                    LIMIT_EXCEEDED_KEY.to_string(),
                    format!(
                        "[{} contains too many files. Only first {} files shown]",
                        self.subject, self.max_files
                    ),
                );
                break;
            }

            let key = rel_key(rel);
            let size = match resolved.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    files.insert(key, format!("[Error reading file: {}]", e));
                    continue;
                }
            };

            if !self.is_previewable(rel) {
                files.insert(key, format!("[Binary file: {}]", format_size(size)));
                continue;
            }
            if size > self.max_file_bytes {
                files.insert(key, format!("[File too large to preview: {}]", format_size(size)));
                continue;
            }
            if total_bytes + size > self.max_total_bytes {
                // Listed but not inlined; does not consume the budget
                files.insert(key, TOTAL_LIMIT_PLACEHOLDER.to_string());
                continue;
            }
            match fs::read(&resolved) {
                Ok(bytes) => {
                    total_bytes += size;
                    files.insert(key, String::from_utf8_lossy(&bytes).into_owned());
                }
                Err(e) => {
                    debug!("failed to read {}: {}", resolved.display(), e);
                    files.insert(key, format!("[Error reading file: {}]", e));
                }
            }
        }

        Ok(TreePreview {
            dir: root.to_path_buf(),
            files,
        })
    }

    fn is_previewable(&self, path: &Path) -> bool {
        if !self.text_only {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

fn is_tooling_path(rel: &Path) -> bool {
    rel.iter().any(|part| {
        let part = part.to_string_lossy();
        IGNORED_COMPONENTS.iter().any(|c| part.as_ref() == *c) || part.ends_with(".egg-info")
    })
}

/// Listing keys are slash-separated regardless of platform
fn rel_key(rel: &Path) -> String {
    rel.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Human-readable size used in preview placeholders
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
