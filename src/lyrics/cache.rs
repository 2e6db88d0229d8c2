use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::lyrics::{LyricsDocument, LyricsSource};
use crate::utils::{build_search_query, write_atomic};

/// 缓存读写错误
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("缓存 IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("缓存元数据格式错误: {0}")]
    Sidecar(#[from] serde_json::Error),
}

/// 与歌词正文一起保存的元数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Sidecar {
    title: String,
    artist: String,
    cache_key: String,
}

/// 缓存键：规范化后的 (艺术家, 标题) 的 sha256
///
/// 只取决于规范化结果，与播放器无关。
pub fn cache_key(artist: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(artist.as_bytes());
    hasher.update([0x1f]);
    hasher.update(title.as_bytes());
    hex::encode(hasher.finalize())
}

/// 基于磁盘的歌词缓存
///
/// 每首歌保存为 `<key>.lrc` 与 `<key>.meta` 两个文件。正文为空表示确认没有歌词。
/// 条目不会过期，只有元数据与当前曲目不一致时才会失效。
pub struct TrackCache {
    directory: PathBuf,
    source: Arc<dyn LyricsSource>,
    max_artist_query_len: usize,
    artist_search_mappings: HashMap<String, String>,
}

impl TrackCache {
    pub fn new(config: &CacheConfig, source: Arc<dyn LyricsSource>) -> Self {
        Self {
            directory: config.directory.clone(),
            source,
            max_artist_query_len: config.max_artist_query_len,
            artist_search_mappings: config.artist_search_mappings.clone(),
        }
    }

    /// 解析歌词：先查缓存，未命中时查询歌词源并写入缓存
    pub async fn resolve(&self, artist: &str, title: &str, key: &str) -> LyricsDocument {
        LyricsDocument::parse(&self.resolve_text(artist, title, key).await)
    }

    /// 同 [`resolve`](Self::resolve)，返回未解析的歌词文本
    pub async fn resolve_text(&self, artist: &str, title: &str, key: &str) -> String {
        if let Some(text) = self.lookup(key, artist, title) {
            debug!("歌词缓存命中: {} - {}", artist, title);
            return text;
        }

        let query =
            build_search_query(title, artist, &self.artist_search_mappings, self.max_artist_query_len);
        info!("搜索歌词: {}", query);

        let text = match self.source.search(&query).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!("没有找到歌词: {}", query);
                String::new()
            }
            Err(e) => {
                // 查询失败不写缓存，下次切歌时重试
                warn!("歌词查询失败: {}", e);
                return String::new();
            }
        };

        if let Err(e) = self.store(key, artist, title, &text) {
            warn!("写入歌词缓存失败: {}", e);
        }

        text
    }

    /// 读取缓存条目
    ///
    /// 元数据缺失、损坏或与 (title, artist) 不一致时删除条目并视为未命中。
    pub fn lookup(&self, key: &str, artist: &str, title: &str) -> Option<String> {
        let body_path = self.body_path(key);
        if !body_path.exists() {
            if self.sidecar_path(key).exists() {
                self.purge(key);
            }
            return None;
        }

        let sidecar = match self.read_sidecar(key) {
            Ok(sidecar) => sidecar,
            Err(e) => {
                warn!("缓存元数据不可用，删除条目 {}: {}", key, e);
                self.purge(key);
                return None;
            }
        };

        if sidecar.title != title || sidecar.artist != artist {
            info!(
                "缓存元数据不匹配，删除条目 {} ({} - {} != {} - {})",
                key, sidecar.artist, sidecar.title, artist, title
            );
            self.purge(key);
            return None;
        }

        match fs::read_to_string(&body_path) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("读取缓存歌词失败，删除条目 {}: {}", key, e);
                self.purge(key);
                None
            }
        }
    }

    /// 写入歌词正文与元数据
    pub fn store(&self, key: &str, artist: &str, title: &str, text: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.directory)?;

        let sidecar = Sidecar {
            title: title.to_string(),
            artist: artist.to_string(),
            cache_key: key.to_string(),
        };

        write_atomic(&self.body_path(key), text.as_bytes())?;
        write_atomic(&self.sidecar_path(key), &serde_json::to_vec(&sidecar)?)?;
        debug!("已缓存歌词: {} - {} ({})", artist, title, key);
        Ok(())
    }

    /// 删除条目，失败只记录日志
    pub fn purge(&self, key: &str) {
        for path in [self.body_path(key), self.sidecar_path(key)] {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("删除缓存文件 {:?} 失败: {}", path, e);
                }
            }
        }
    }

    fn read_sidecar(&self, key: &str) -> Result<Sidecar, CacheError> {
        let content = fs::read_to_string(self.sidecar_path(key))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.lrc", key))
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.meta", key))
    }
}
