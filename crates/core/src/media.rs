//! Video reference resolution.
//!
//! A slide names its video by an opaque reference such as `Slide-2` or
//! `intro.mkv`. Resolution turns that into playable sources, ordered by
//! preference. No sources is a normal outcome and leads to a fallback panel.

use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Extensions tried for a reference, most broadly playable first.
const PREFERRED_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv"];

/// Default directory for relative references.
pub const DEFAULT_MEDIA_ROOT: &str = "/src/videos";

/// A single playable candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoSource {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<&'static str>,
}

impl VideoSource {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let mime = guess_mime(&url);
        Self { url, mime }
    }
}

/// Resolves opaque video references into playable sources.
pub trait MediaResolver {
    fn resolve(&self, reference: &str) -> Vec<VideoSource>;
}

/// Resolver that knows nothing; every reference resolves to no sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

impl MediaResolver for NoMedia {
    fn resolve(&self, _reference: &str) -> Vec<VideoSource> {
        Vec::new()
    }
}

/// Resolver over a fixed set of known media paths.
#[derive(Debug, Clone)]
pub struct MediaCatalog {
    root: String,
    files: BTreeSet<String>,
}

impl MediaCatalog {
    /// Create an empty catalog rooted at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let root = root.trim_end_matches('/').to_string();
        Self {
            root,
            files: BTreeSet::new(),
        }
    }

    /// Register known paths. Relative paths are placed under the root.
    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        for file in files {
            let path = self.normalize(file.as_ref());
            self.files.insert(path);
        }
        self
    }

    /// Build a catalog from the regular files directly inside `dir`.
    pub fn scan_dir(dir: &Path) -> Result<Self> {
        let root = dir.to_string_lossy().to_string();
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        log::debug!("Found {} media files in {}", names.len(), dir.display());
        Ok(Self::new(root).with_files(names))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn normalize(&self, reference: &str) -> String {
        if reference.starts_with('/') {
            reference.to_string()
        } else {
            format!("{}/{}", self.root, reference)
        }
    }
}

impl Default for MediaCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_ROOT)
    }
}

impl MediaResolver for MediaCatalog {
    fn resolve(&self, reference: &str) -> Vec<VideoSource> {
        let mut sources: Vec<VideoSource> = Vec::new();

        if has_extension(reference) {
            let explicit = self.normalize(reference);
            if self.files.contains(&explicit) {
                sources.push(VideoSource::new(explicit));
            }
        }

        let stem = file_stem(reference);
        for ext in PREFERRED_EXTENSIONS {
            let path = format!("{}/{}.{}", self.root, stem, ext);
            if self.files.contains(&path) && !sources.iter().any(|s| s.url == path) {
                sources.push(VideoSource::new(path));
            }
        }

        if sources.is_empty() {
            log::debug!("No media found for reference '{}'", reference);
        }
        sources
    }
}

/// MIME type for a media path. MKV is left untyped so players sniff it.
pub fn guess_mime(path: &str) -> Option<&'static str> {
    match extension(path)?.to_lowercase().as_str() {
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}

fn file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn extension(reference: &str) -> Option<&str> {
    file_name(reference).rsplit_once('.').map(|(_, ext)| ext)
}

fn has_extension(reference: &str) -> bool {
    file_name(reference).contains('.')
}

/// File name without its last extension.
fn file_stem(reference: &str) -> &str {
    let name = file_name(reference);
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}
