//! Pre-loaded image assets (faces) handed out round-robin.
//!
//! The pool is read-only after loading. The cursor is an atomic counter, so a
//! pool shared across threads never skips or repeats an asset out of turn.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// 1x1 transparent PNG, used when no pool is configured.
pub const PLACEHOLDER_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

pub trait AssetPool: Send + Sync {
    /// Next data URI, or `None` for an empty pool.
    fn next(&self) -> Option<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset {path} is not a `{{\"dataUri\": ...}}` document: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
pub struct RoundRobinPool {
    assets: Vec<String>,
    cursor: AtomicUsize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetFile {
    data_uri: String,
}

impl RoundRobinPool {
    pub fn new(assets: Vec<String>) -> Self {
        Self {
            assets,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir` (sorted by file name). Each file
    /// holds `{"dataUri": "data:image/...;base64,..."}`.
    pub fn from_dir(dir: &Path) -> Result<Self, AssetError> {
        let io_err = |source| AssetError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut assets = Vec::with_capacity(paths.len());
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;
            let file: AssetFile = serde_json::from_str(&text)
                .map_err(|source| AssetError::Json { path, source })?;
            assets.push(file.data_uri);
        }

        tracing::debug!(dir = %dir.display(), assets = assets.len(), "loaded asset pool");
        Ok(Self::new(assets))
    }
}

impl AssetPool for RoundRobinPool {
    fn next(&self) -> Option<String> {
        if self.assets.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.assets.len();
        Some(self.assets[idx].clone())
    }

    fn len(&self) -> usize {
        self.assets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_in_order() {
        let pool = RoundRobinPool::new(vec!["a".into(), "b".into()]);
        let drawn: Vec<_> = (0..5).filter_map(|_| pool.next()).collect();
        assert_eq!(drawn, vec!["a", "b", "a", "b", "a"]);
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let pool = RoundRobinPool::empty();
        assert!(pool.is_empty());
        assert_eq!(pool.next(), None);
    }

    #[test]
    fn loads_sorted_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), r#"{"dataUri":"data:b"}"#).unwrap();
        fs::write(dir.path().join("a.json"), r#"{"dataUri":"data:a"}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let pool = RoundRobinPool::from_dir(dir.path()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.next().as_deref(), Some("data:a"));
        assert_eq!(pool.next().as_deref(), Some("data:b"));
    }

    #[test]
    fn malformed_asset_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), r#"{"uri":"x"}"#).unwrap();
        assert!(matches!(
            RoundRobinPool::from_dir(dir.path()),
            Err(AssetError::Json { .. })
        ));
    }
}
