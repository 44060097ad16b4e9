//! The catalog document and its storage.
//!
//! The document is modelled with typed fields for everything the transforms
//! touch, and a flattened map for everything else so a load/save round trip
//! never drops data written by other tools.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("catalog is not valid JSON: {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("niche with slug '{0}' not found")]
    NicheNotFound(String),

    #[error("catalog has no niches")]
    Empty,
}

const LAST_UPDATED: &str = "last_updated";

/// `last_updated` lives in `extra` so an explicit `null` survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, deserialize_with = "null_as_default")]
    pub niches: Vec<Niche>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Niche {
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub books: Vec<Book>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amazon_link: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Catalog {
    pub fn book_count(&self) -> usize {
        self.niches.iter().map(|niche| niche.books.len()).sum()
    }

    /// Index of the niche keyed by `slug`.
    pub fn position(&self, slug: &str) -> Result<usize, CatalogError> {
        self.niches
            .iter()
            .position(|niche| niche.slug == slug)
            .ok_or_else(|| CatalogError::NicheNotFound(slug.to_owned()))
    }

    pub fn books_mut(&mut self) -> impl Iterator<Item = &mut Book> {
        self.niches.iter_mut().flat_map(|niche| niche.books.iter_mut())
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.extra.get(LAST_UPDATED).and_then(Value::as_str)
    }

    pub fn touch(&mut self) {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        self.extra.insert(LAST_UPDATED.to_owned(), Value::String(now));
    }
}

/// Whole-document access to wherever the catalog lives.
pub trait CatalogStore {
    fn load(&self) -> Result<Catalog, CatalogError>;
    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError>;
    /// Human-readable destination, used in log lines.
    fn location(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogStore for FileStore {
    fn load(&self) -> Result<Catalog, CatalogError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let mut json = serde_json::to_string_pretty(catalog).map_err(CatalogError::Serialize)?;
        json.push('\n');

        let io_err = |source| CatalogError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;

        tracing::info!(path = %self.path.display(), "catalog saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
