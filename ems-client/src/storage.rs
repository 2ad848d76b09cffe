// ems-client/src/storage.rs
// 本地持久化存储 - 每个 key 一个 JSON 文件

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// 持久化的 key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// 认证 token (不透明字符串)
    AuthToken,
    /// 当前用户 (序列化的 User)
    AuthUser,
    /// 主题偏好
    Theme,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthToken => "auth_token",
            Self::AuthUser => "auth_user",
            Self::Theme => "theme_preference",
        }
    }
}

/// 原始 key-value 存储
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// 文件存储: {dir}/{key}.json
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 获取目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        // 确保目录存在
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// 内存存储 (测试 / 临时会话)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// 带 JSON 序列化的存储门面
///
/// 读取失败或解析失败一律视为不存在；写入失败只记录日志。
#[derive(Clone)]
pub struct Storage {
    inner: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// 内存存储
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// 读取
    pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let raw = match self.inner.read(key.as_str()) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "Failed to read storage");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "Corrupt storage entry ignored");
                None
            }
        }
    }

    /// 写入
    pub fn set<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "Failed to serialize storage entry");
                return;
            }
        };
        if let Err(e) = self.inner.write(key.as_str(), &json) {
            tracing::warn!(key = key.as_str(), error = %e, "Failed to write storage");
        }
    }

    /// 删除
    pub fn remove(&self, key: StorageKey) {
        if let Err(e) = self.inner.remove(key.as_str()) {
            tracing::warn!(key = key.as_str(), error = %e, "Failed to remove storage entry");
        }
    }

    /// 检查是否存在 (可解析的) 值
    pub fn contains(&self, key: StorageKey) -> bool {
        self.get::<serde_json::Value>(key).is_some_and(|v| !v.is_null())
    }
}
