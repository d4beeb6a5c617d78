//! Offline descriptor fetcher
//!
//! Fixtures are keyed by kind and `name` parameter. On disk they live at
//! `<dir>/<kind>/<name>.json` (or `.yaml`/`.yml`); kinds without a name, such
//! as `binauthz-policy`, use `<dir>/<kind>.json`.

use anyhow::{bail, Context, Result};
use glob::{glob, Pattern};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::DescriptorFetcher;
use crate::error::{FetchError, FetchErrorKind};
use crate::models::document::{Document, DocumentFormat};
use crate::models::identity::ResourceIdentity;

type FixtureKey = (String, Option<String>);

#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    documents: HashMap<FixtureKey, Document>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(identity: &ResourceIdentity) -> FixtureKey {
        (identity.kind.clone(), identity.name().map(str::to_string))
    }

    pub fn insert(&mut self, identity: &ResourceIdentity, document: Document) {
        self.documents.insert(Self::key(identity), document);
    }

    /// Builder-style variant of [`FixtureFetcher::insert`]
    pub fn with(mut self, identity: &ResourceIdentity, document: Document) -> Self {
        self.insert(identity, document);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Load every fixture file under `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("Fixture directory {} does not exist", dir.display());
        }
        let mut fetcher = Self::new();
        let root = Pattern::escape(&dir.to_string_lossy());

        for path in fixture_files(&format!("{root}/*/*"))? {
            let Some(kind) = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
            else {
                continue;
            };
            if let Some((name, doc)) = load_fixture_file(&path)? {
                fetcher.insert(&ResourceIdentity::new(kind).with_param("name", name), doc);
            }
        }

        for path in fixture_files(&format!("{root}/*"))? {
            if let Some((kind, doc)) = load_fixture_file(&path)? {
                fetcher.insert(&ResourceIdentity::new(kind), doc);
            }
        }

        debug!(count = fetcher.len(), dir = %dir.display(), "loaded fixtures");
        Ok(fetcher)
    }
}

/// Regular files matching `pattern`
fn fixture_files(pattern: &str) -> Result<Vec<PathBuf>> {
    Ok(glob(pattern)
        .map_err(|e| anyhow::anyhow!("Invalid glob pattern '{pattern}': {e}"))?
        .filter_map(|r| r.ok())
        .filter(|path| path.is_file())
        .collect())
}

/// Parse one fixture file; returns its stem and document, or `None` for
/// files that are not JSON/YAML.
fn load_fixture_file(path: &Path) -> Result<Option<(String, Document)>> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => DocumentFormat::Json,
        Some("yaml" | "yml") => DocumentFormat::Yaml,
        _ => return Ok(None),
    };
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Ok(None);
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    let doc = Document::parse(&text, format)
        .with_context(|| format!("Failed to parse fixture {}", path.display()))?;

    Ok(Some((stem.to_string(), doc)))
}

impl DescriptorFetcher for FixtureFetcher {
    fn fetch(&self, identity: &ResourceIdentity) -> Result<Document, FetchError> {
        self.documents
            .get(&Self::key(identity))
            .cloned()
            .ok_or_else(|| FetchError::new(identity, FetchErrorKind::NotFound, "no fixture"))
    }
}
