use std::path::PathBuf;

use anyhow::Result;
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Logical subdirectories of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Avatars,
    Articles,
}

impl Area {
    pub fn as_str(self) -> &'static str {
        match self {
            Area::Avatars => "avatars",
            Area::Articles => "articles",
        }
    }
}

/// Directory-scoped blob store. Filenames are generated, opaque and
/// unique; database rows reference blobs by name only. The store never
/// propagates failures: they are logged, and callers see an absent
/// value instead.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for area in [Area::Avatars, Area::Articles] {
            fs::create_dir_all(root.join(area.as_str())).await?;
        }
        info!("File store rooted at {}", root.display());
        Ok(Self { root })
    }

    fn path(&self, area: Area, name: &str) -> PathBuf {
        self.root.join(area.as_str()).join(name)
    }

    /// Save binary content under a fresh name, preserving the original
    /// extension. Returns `None` on failure; callers treat that as "no
    /// file stored".
    pub async fn save_binary(
        &self,
        area: Area,
        original_name: &str,
        data: &[u8],
    ) -> Option<String> {
        let name = match original_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
            _ => Uuid::new_v4().to_string(),
        };
        match fs::write(self.path(area, &name), data).await {
            Ok(()) => Some(name),
            Err(e) => {
                error!("Failed to save {} under {}: {}", name, area.as_str(), e);
                None
            }
        }
    }

    /// Save text under a fresh `.md` name. The write is detached: the
    /// name returns immediately and the caller does not wait for the
    /// bytes to reach disk.
    pub fn save_text(&self, area: Area, text: String) -> String {
        let name = format!("{}.md", Uuid::new_v4());
        let path = self.path(area, &name);
        tokio::spawn(async move {
            if let Err(e) = fs::write(&path, text).await {
                error!("Failed to write {}: {}", path.display(), e);
            }
        });
        name
    }

    /// Read a stored text file. Not-found and I/O failures both surface
    /// as `None`.
    pub async fn read_text(&self, name: &str, area: Area) -> Option<String> {
        match fs::read_to_string(self.path(area, name)).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to read {} under {}: {}", name, area.as_str(), e);
                None
            }
        }
    }

    /// Best-effort removal; failures are logged, never propagated.
    pub async fn delete(&self, name: &str, area: Area) {
        if let Err(e) = fs::remove_file(self.path(area, name)).await {
            warn!("Failed to delete {} under {}: {}", name, area.as_str(), e);
        }
    }

    /// Detached best-effort removal for the fire-and-forget paths; the
    /// request completes without waiting for the filesystem.
    pub fn delete_detached(&self, name: String, area: Area) {
        let path = self.path(area, &name);
        tokio::spawn(async move {
            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to delete {}: {}", path.display(), e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn store() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn binary_save_preserves_extension() {
        let (store, dir) = store().await;
        let name = store
            .save_binary(Area::Avatars, "portrait.png", b"\x89PNG")
            .await
            .unwrap();
        assert!(name.ends_with(".png"));
        assert_ne!(name, "portrait.png");

        let on_disk = std::fs::read(dir.path().join("avatars").join(&name)).unwrap();
        assert_eq!(on_disk, b"\x89PNG");
    }

    #[tokio::test]
    async fn text_save_is_eventually_readable() {
        let (store, _dir) = store().await;
        let name = store.save_text(Area::Articles, "# hello".to_string());
        assert!(name.ends_with(".md"));

        // The write is detached; poll briefly for it to land.
        for _ in 0..100 {
            if let Some(text) = store.read_text(&name, Area::Articles).await {
                assert_eq!(text, "# hello");
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("detached write never landed");
    }

    #[tokio::test]
    async fn read_of_missing_file_is_none() {
        let (store, _dir) = store().await;
        assert!(store.read_text("nope.md", Area::Articles).await.is_none());
    }

    #[tokio::test]
    async fn delete_is_best_effort() {
        let (store, dir) = store().await;
        let name = store
            .save_binary(Area::Avatars, "a.jpg", b"data")
            .await
            .unwrap();
        store.delete(&name, Area::Avatars).await;
        assert!(!dir.path().join("avatars").join(&name).exists());

        // Deleting a file that is already gone must not blow up.
        store.delete("already-gone.jpg", Area::Avatars).await;
    }
}
