//! 缓存旁路助手
//!
//! 以字符串为键的读穿缓存：命中时直接返回，未命中时调用获取函数、写入缓存
//! 后返回。存储后端由调用方注入，值以 JSON 形式保存。
//!
//! token 核心不依赖本模块。
//!
//! ## 示例
//!
//! ```rust
//! use tokenauth::cache::{get_or_populate, keys, InMemoryCache};
//!
//! // 调用方自己的错误类型，缓存层错误经 `From` 转换
//! #[derive(Debug)]
//! enum RemoteError {
//!     Unavailable,
//!     Cache(tokenauth::Error),
//! }
//!
//! impl From<tokenauth::Error> for RemoteError {
//!     fn from(err: tokenauth::Error) -> Self {
//!         RemoteError::Cache(err)
//!     }
//! }
//!
//! let cache = InMemoryCache::new();
//! let key = keys::teams("octocat");
//!
//! let teams: Vec<String> =
//!     get_or_populate(&cache, &key, || Ok::<_, RemoteError>(vec!["core".to_string()])).unwrap();
//! assert_eq!(teams, vec!["core"]);
//!
//! // 第二次调用命中缓存，不再调用获取函数
//! let cached: Result<Vec<String>, RemoteError> =
//!     get_or_populate(&cache, &key, || Err(RemoteError::Unavailable));
//! assert_eq!(cached.unwrap(), teams);
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{trace, warn};

use crate::error::{Error, Result, StorageError};

/// 缓存存储 trait
pub trait CacheStore: Send + Sync {
    /// 读取键对应的值
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// 写入键值
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// 内存缓存
///
/// 没有过期与容量限制，用于开发和测试
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 删除一个键，返回是否存在
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        Ok(entries.remove(key).is_some())
    }

    /// 缓存条目数
    pub fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        Ok(entries.len())
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// 缓存键
pub mod keys {
    /// 用户的仓库列表
    pub fn repos(login: &str) -> String {
        format!("repos:{}", login)
    }

    /// 用户的团队列表
    pub fn teams(login: &str) -> String {
        format!("teams:{}", login)
    }

    /// 用户对某个仓库的权限
    pub fn perms(login: &str, owner: &str, name: &str) -> String {
        format!("perms:{}:{}/{}", login, owner, name)
    }

    /// 团队成员列表
    pub fn members(team: &str) -> String {
        format!("members:{}", team)
    }
}

/// 读取缓存，未命中时调用 `fetch` 并写回
///
/// 读取失败或缓存值无法反序列化时按未命中处理。`fetch` 的错误原样返回，
/// 且不写入缓存；写入或序列化失败经 `E: From<Error>` 转换后返回。
pub fn get_or_populate<T, S, F, E>(
    store: &S,
    key: &str,
    fetch: F,
) -> std::result::Result<T, E>
where
    T: Serialize + DeserializeOwned,
    S: CacheStore + ?Sized,
    F: FnOnce() -> std::result::Result<T, E>,
    E: From<Error>,
{
    match store.get(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(cached) => {
                trace!(key, "cache hit");
                return Ok(cached);
            }
            Err(err) => warn!(key, error = %err, "cached value could not be decoded"),
        },
        Ok(None) => trace!(key, "cache miss"),
        Err(err) => warn!(key, error = %err, "cache read failed"),
    }

    let fresh = fetch()?;
    let value = serde_json::to_value(&fresh)
        .map_err(|e| Error::Storage(StorageError::Serialization(e.to_string())))?;
    store.set(key, value)?;
    trace!(key, "cache populated");
    Ok(fresh)
}
