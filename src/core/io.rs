use async_trait::async_trait;
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[cfg(target_arch = "wasm32")]
pub trait StorageBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> StorageBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait StorageBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> StorageBounds for T {}

/// String key-value store. Single writer, last write wins.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Storage: StorageBounds {
    async fn read(&self, key: &str) -> Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
    async fn clear_all(&self) -> Result<()>;
    async fn usage(&self) -> Result<u64>;
}

// --- In-memory Implementation ---

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("MemoryStorage lock poisoned"))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Storage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn clear_all(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    async fn usage(&self) -> Result<u64> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum())
    }
}

// --- Native Implementation ---

#[cfg(not(target_arch = "wasm32"))]
use anyhow::Context;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

/// One `<folder>/<key>.json` file per key.
#[cfg(not(target_arch = "wasm32"))]
pub struct NativeStorage {
    folder: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl NativeStorage {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            || key.starts_with('.')
        {
            anyhow::bail!("Invalid storage key: {:?}", key);
        }
        Ok(self.folder.join(format!("{}.json", key)))
    }

    fn key_of(path: &std::path::Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        name.strip_suffix(".json").map(|k| k.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl Storage for NativeStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.folder).await?;
        tokio::fs::write(&path, value)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if !tokio::fs::try_exists(&self.folder).await? {
            return Ok(keys);
        }

        let mut dir = tokio::fs::read_dir(&self.folder).await?;
        while let Some(entry) = dir.next_entry().await? {
            if let Some(key) = Self::key_of(&entry.path()) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear_all(&self) -> Result<()> {
        for key in self.list("").await? {
            self.delete(&key).await?;
        }
        Ok(())
    }

    async fn usage(&self) -> Result<u64> {
        let mut total = 0;
        for key in self.list("").await? {
            let meta = tokio::fs::metadata(self.path_for(&key)?).await?;
            total += meta.len();
        }
        Ok(total)
    }
}

// --- Web Implementation ---

#[cfg(target_arch = "wasm32")]
use anyhow::anyhow;

/// `window.localStorage`.
#[cfg(target_arch = "wasm32")]
pub struct WebStorage {
    inner: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl WebStorage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow!("No window available"))?;
        let inner = window
            .local_storage()
            .map_err(|e| anyhow!("Failed to access localStorage: {:?}", e))?
            .ok_or_else(|| anyhow!("localStorage is disabled"))?;
        Ok(Self { inner })
    }

    fn keys(&self) -> Result<Vec<String>> {
        let len = self
            .inner
            .length()
            .map_err(|e| anyhow!("Length error: {:?}", e))?;
        let mut keys = Vec::new();
        for i in 0..len {
            if let Some(k) = self.inner.key(i).map_err(|e| anyhow!("Key error: {:?}", e))? {
                keys.push(k);
            }
        }
        Ok(keys)
    }
}

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl Storage for WebStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        self.inner
            .get_item(key)
            .map_err(|e| anyhow!("Get error: {:?}", e))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .set_item(key, value)
            .map_err(|e| anyhow!("Set error: {:?}", e))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner
            .remove_item(key)
            .map_err(|e| anyhow!("Remove error: {:?}", e))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.read(key).await?.is_some())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear_all(&self) -> Result<()> {
        self.inner.clear().map_err(|e| anyhow!("Clear error: {:?}", e))
    }

    async fn usage(&self) -> Result<u64> {
        let mut total = 0u64;
        for key in self.keys()? {
            let value = self.read(&key).await?.unwrap_or_default();
            total += (key.len() + value.len()) as u64;
        }
        Ok(total)
    }
}
