//! Resolving and loading referenced resources.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{Error, Result};

/// Fetches stylesheet text for `<link>` and `@import` targets.
pub trait ResourceLoader: Send + Sync {
    /// Load the resource at `url`.
    ///
    /// Returns `Ok(None)` when the loader does not handle the URL (e.g. a
    /// remote font sheet for a file-system loader); the reference is then
    /// skipped. Errors are fatal for the run.
    fn load(&self, url: &Url) -> Result<Option<String>>;
}

/// Loads `file:` URLs from disk.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

#[cfg(not(target_arch = "wasm32"))]
impl ResourceLoader for FileLoader {
    fn load(&self, url: &Url) -> Result<Option<String>> {
        if url.scheme() != "file" {
            return Ok(None);
        }
        let path = url
            .to_file_path()
            .map_err(|()| Error::Resolution(format!("not a local file: {url}")))?;
        crate::util::read_text_file(&path)
            .map(Some)
            .map_err(|e| Error::Resolution(format!("cannot load {url}: {e}")))
    }
}

/// In-memory resources keyed by absolute URL.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    entries: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. `url` must be absolute.
    pub fn with(mut self, url: &str, content: impl Into<String>) -> Result<Self> {
        let url = Url::parse(url)?;
        self.entries.insert(url.into(), content.into());
        Ok(self)
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, url: &Url) -> Result<Option<String>> {
        Ok(self.entries.get(url.as_str()).cloned())
    }
}

/// Resolve `href` against `base`. Without a base, `href` must be absolute.
pub fn resolve_reference(base: Option<&Url>, href: &str) -> Result<Url> {
    let href = href.trim();
    match base {
        Some(base) => Ok(base.join(href)?),
        None => Url::parse(href).map_err(|e| {
            Error::Resolution(format!(
                "cannot resolve relative reference `{href}` without a base URL ({e})"
            ))
        }),
    }
}
