//! Content-addressed artifact store
//!
//! Artifacts live at `{root}/{domain}/{sha256(url)}.html`. The path is a
//! pure function of (domain, url), so repeated fetches of the same URL
//! overwrite deterministically and concurrent writers across domains never
//! contend on the same file.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Hierarchical store for cleaned page markup
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Computes the artifact path for a URL; pure, no filesystem access
    pub fn artifact_path(&self, domain: &str, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.root
            .join(domain)
            .join(format!("{}.html", hex::encode(digest)))
    }

    /// Writes cleaned markup for a URL, returning the artifact path
    ///
    /// The domain directory is created if absent. A write failure is logged
    /// and reported as `None` so callers record a failed persistence instead
    /// of unwinding.
    pub fn save(&self, domain: &str, url: &str, markup: &str) -> Option<PathBuf> {
        let path = self.artifact_path(domain, url);
        match self.write_file(&path, markup) {
            Ok(()) => {
                tracing::info!("Stored HTML artifact: {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("Failed to store HTML for {}: {}", url, e);
                None
            }
        }
    }

    // The handle closes on every exit path when `file` drops.
    fn write_file(&self, path: &Path, markup: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(markup.as_bytes())?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn artifact_path_is_deterministic() {
        let store = ContentStore::new("/data/html");
        let first = store.artifact_path("shop.example.com", "https://shop.example.com/p/1");
        let second = store.artifact_path("shop.example.com", "https://shop.example.com/p/1");
        assert_eq!(first, second);
        assert!(first.starts_with("/data/html/shop.example.com"));
        assert_eq!(first.extension().unwrap(), "html");
    }

    #[test]
    fn different_urls_never_collide() {
        let store = ContentStore::new("/data/html");
        let a = store.artifact_path("shop.example.com", "https://shop.example.com/p/1");
        let b = store.artifact_path("shop.example.com", "https://shop.example.com/p/2");
        assert_ne!(a, b);
    }

    #[test]
    fn repeated_saves_overwrite_in_place() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path());
        let url = "https://shop.example.com/p/1";

        let first = store.save("shop.example.com", url, "<p>v1</p>").unwrap();
        let second = store.save("shop.example.com", url, "<p>v2</p>").unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "<p>v2</p>");
        // Exactly one artifact under the domain directory
        let entries = std::fs::read_dir(dir.path().join("shop.example.com"))
            .unwrap()
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn write_failure_yields_none() {
        // Root is a file, so the domain directory cannot be created
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "x").unwrap();

        let store = ContentStore::new(&blocker);
        assert!(store
            .save("shop.example.com", "https://shop.example.com/p/1", "<p/>")
            .is_none());
    }
}
