mod cache;
mod document;
pub mod providers;

use async_trait::async_trait;

pub use cache::{cache_key, CacheError, TrackCache};
pub use document::{LyricLine, LyricsDocument};
pub use providers::ProviderChain;

/// 歌词获取错误
#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    #[error("网络请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("歌词源 {provider} 返回异常: {reason}")]
    Provider { provider: String, reason: String },
}

/// 单个歌词后端
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// 获取提供者名称
    fn name(&self) -> &str;

    /// 按关键字搜索歌词，`Ok(None)` 表示确认没有找到
    async fn search_lyrics(&self, query: &str) -> Result<Option<String>, LyricsError>;
}

/// 歌词源能力：给定搜索关键字返回歌词文本
#[async_trait]
pub trait LyricsSource: Send + Sync {
    /// `Ok(None)` 表示所有后端都确认没有歌词，`Err` 表示本次查询失败
    async fn search(&self, query: &str) -> Result<Option<String>, LyricsError>;
}
