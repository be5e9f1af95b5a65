//! Template sources
//!
//! A [`TemplateSource`] maps a namespace location (`jira/ticket/react`,
//! `custom/defaults/ticket`) to raw template text. The store calls it only on
//! a cache miss.

use crate::error::LoadError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File extension for templates on disk
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// Default maximum template file size (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Pluggable template storage
#[async_trait]
pub trait TemplateSource: Send + Sync + Debug + 'static {
    /// Fetch raw text for a location; `Ok(None)` when it does not exist
    async fn fetch(&self, location: &str) -> Result<Option<String>, LoadError>;

    /// All locations this source holds, sorted
    async fn list(&self) -> Result<Vec<String>, LoadError>;
}

/// Filesystem source rooted at a directory
///
/// Location `a/b/c` maps to `<root>/a/b/c.tpl`.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
    max_file_size: u64,
}

impl FsTemplateSource {
    /// Create source rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// With maximum file size
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, location: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in location.split('/') {
            path.push(segment);
        }
        path.set_extension(TEMPLATE_EXTENSION);
        path
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn fetch(&self, location: &str) -> Result<Option<String>, LoadError> {
        let path = self.path_for(location);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LoadError::io_error(location, e)),
        };
        if !metadata.is_file() {
            return Ok(None);
        }
        if metadata.len() > self.max_file_size {
            return Err(LoadError::io_error(
                location,
                std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "file too large: {} bytes (max: {})",
                        metadata.len(),
                        self.max_file_size
                    ),
                ),
            ));
        }
        tokio::fs::read_to_string(&path)
            .await
            .map(Some)
            .map_err(|e| LoadError::io_error(location, e))
    }

    async fn list(&self) -> Result<Vec<String>, LoadError> {
        let mut out = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(LoadError::io_error(dir.display().to_string(), e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| LoadError::io_error(dir.display().to_string(), e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| LoadError::io_error(path.display().to_string(), e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if path.extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION) {
                    if let Some(location) = location_of(&self.root, &path) {
                        out.push(location);
                    }
                }
            }
        }
        out.sort();
        Ok(out)
    }
}

fn location_of(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(segments.join("/"))
}

/// In-memory source for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryTemplateSource {
    entries: DashMap<String, String>,
}

impl MemoryTemplateSource {
    /// Create empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a template at `location`
    #[must_use]
    pub fn with_template(self, location: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(location, body);
        self
    }

    /// Insert or replace a template
    pub fn insert(&self, location: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(location.into(), body.into());
    }

    /// Remove a template
    pub fn remove(&self, location: &str) -> Option<String> {
        self.entries.remove(location).map(|(_, body)| body)
    }
}

#[async_trait]
impl TemplateSource for MemoryTemplateSource {
    async fn fetch(&self, location: &str) -> Result<Option<String>, LoadError> {
        Ok(self.entries.get(location).map(|body| body.value().clone()))
    }

    async fn list(&self) -> Result<Vec<String>, LoadError> {
        let mut out: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        out.sort();
        Ok(out)
    }
}
