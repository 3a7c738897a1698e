use crate::fs::{read_json, write_json};
use crate::schema::news::Article;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Key holding the serialized article array.
pub const KEY: &str = "newsBookmarks";

/// Bookmarked articles, kept in a local JSON document under [`KEY`].
///
/// Other keys in the document are preserved on write.
#[derive(Clone, Debug)]
pub struct BookmarkStore {
    path: PathBuf,
}

impl BookmarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bookmarks in insertion order; a missing file is an empty list.
    pub async fn list(&self) -> Result<Vec<Article>> {
        let document = self.load().await?;
        articles(&document)
    }

    /// Appends `article` unless its id is already bookmarked; returns whether it was added.
    pub async fn add(&self, article: &Article) -> Result<bool> {
        let mut document = self.load().await?;
        let mut saved = articles(&document)?;
        if saved.iter().any(|a| a.id == article.id) {
            debug!("{} already bookmarked", article.id);
            return Ok(false);
        }

        saved.push(article.clone());
        document.insert(KEY.to_string(), serde_json::to_value(&saved)?);
        write_json(&self.path, &document).await?;
        info!("bookmarked {}", article.id);
        Ok(true)
    }

    /// Drops the bookmark with `id`; returns whether one existed.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut document = self.load().await?;
        let mut saved = articles(&document)?;
        let before = saved.len();
        saved.retain(|a| a.id != id);
        if saved.len() == before {
            return Ok(false);
        }

        document.insert(KEY.to_string(), serde_json::to_value(&saved)?);
        write_json(&self.path, &document).await?;
        info!("removed bookmark {id}");
        Ok(true)
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }
        read_json(&self.path)
            .await
            .with_context(|| format!("reading bookmarks from {}", self.path.display()))
    }
}

fn articles(document: &Map<String, Value>) -> Result<Vec<Article>> {
    match document.get(KEY) {
        Some(value) => serde_json::from_value(value.clone())
            .with_context(|| format!("malformed {KEY} entry")),
        None => Ok(vec![]),
    }
}
