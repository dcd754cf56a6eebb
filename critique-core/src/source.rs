//! Loading the file under review

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::OversizePolicy;
use crate::{Error, Result};

/// A source file read fully into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    contents: String,
}

/// Result of applying the oversize policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOutcome {
    /// The file fits the limit
    WithinLimit,
    /// The file is over the limit and will be sent whole
    Oversize { chars: usize },
    /// The file was cut down to the limit
    Truncated { original_chars: usize },
}

impl SourceFile {
    /// Read `path` as UTF-8 text
    ///
    /// Fails with `FileAccess` if the path is missing, is a directory, or
    /// cannot be decoded, and with `EmptySource` if it holds only whitespace.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            IoErrorKind::NotFound => Error::file_access(path, "file not found"),
            _ => Error::file_access(path, e.to_string()),
        })?;

        if metadata.is_dir() {
            return Err(Error::file_access(path, "is a directory"));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            IoErrorKind::InvalidData => Error::file_access(path, "file is not valid UTF-8 text"),
            _ => Error::file_access(path, e.to_string()),
        })?;

        if contents.trim().is_empty() {
            return Err(Error::EmptySource(path.to_path_buf()));
        }

        debug!(path = %path.display(), bytes = contents.len(), "Loaded source file");

        Ok(Self {
            path: path.to_path_buf(),
            contents,
        })
    }

    /// Build a source file from in-memory text
    pub fn from_parts(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Path as given by the user
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used in prompts and the report banner
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File text
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Length in characters (not bytes)
    pub fn char_count(&self) -> usize {
        self.contents.chars().count()
    }

    /// Code-fence language tag derived from the extension
    pub fn language(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("py") | Some("pyi") => "python",
            Some("rs") => "rust",
            Some("go") => "go",
            Some("js") | Some("mjs") | Some("cjs") => "javascript",
            Some("ts") | Some("tsx") => "typescript",
            Some("java") => "java",
            Some("kt") => "kotlin",
            Some("rb") => "ruby",
            Some("c") | Some("h") => "c",
            Some("cc") | Some("cpp") | Some("hpp") => "cpp",
            Some("cs") => "csharp",
            Some("sh") | Some("bash") => "bash",
            Some("sql") => "sql",
            _ => "",
        }
    }

    /// Check the file against `limit` characters
    pub fn apply_size_policy(
        &mut self,
        limit: usize,
        policy: OversizePolicy,
    ) -> Result<SizeOutcome> {
        let chars = self.char_count();
        if chars <= limit {
            return Ok(SizeOutcome::WithinLimit);
        }

        match policy {
            OversizePolicy::Warn => {
                warn!(
                    path = %self.path.display(),
                    chars,
                    limit,
                    "Source file exceeds size limit"
                );
                Ok(SizeOutcome::Oversize { chars })
            }
            OversizePolicy::Truncate => {
                let cut = self
                    .contents
                    .char_indices()
                    .nth(limit)
                    .map(|(idx, _)| idx)
                    .unwrap_or(self.contents.len());
                self.contents.truncate(cut);

                if self.contents.trim().is_empty() {
                    return Err(Error::EmptySource(self.path.clone()));
                }

                warn!(path = %self.path.display(), chars, limit, "Source file truncated");
                Ok(SizeOutcome::Truncated {
                    original_chars: chars,
                })
            }
            OversizePolicy::Reject => Err(Error::SourceTooLarge {
                path: self.path.clone(),
                chars,
                limit,
            }),
        }
    }
}
