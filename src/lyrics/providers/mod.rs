mod local;
mod lrclib;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::lyrics::{LyricsError, LyricsProvider, LyricsSource};

pub use local::LocalProvider;
pub use lrclib::LrclibProvider;

/// 获取所有启用的歌词提供者
pub fn get_enabled_providers(config: &Config) -> Vec<Arc<dyn LyricsProvider>> {
    let mut providers: Vec<Arc<dyn LyricsProvider>> = Vec::new();

    debug!("加载启用的歌词提供者，配置的源: {:?}", config.lyrics_sources);

    // 根据配置文件中启用的提供者进行创建
    for source in &config.lyrics_sources {
        match source.as_str() {
            "lrclib" => match &config.sources.lrclib {
                Some(lrclib_config) => match LrclibProvider::new(lrclib_config.clone()) {
                    Ok(provider) => {
                        info!("启用 LRCLIB 歌词源: {}", lrclib_config.base_url);
                        providers.push(Arc::new(provider));
                    }
                    Err(e) => warn!("创建 LRCLIB 客户端失败: {}", e),
                },
                None => warn!("已启用 LRCLIB 歌词源，但未找到相关配置"),
            },
            "local" => match &config.sources.local {
                Some(local_config) => {
                    info!("启用本地歌词源，歌词目录: {}", local_config.lyrics_path);
                    providers.push(Arc::new(LocalProvider::new(local_config.clone())));
                }
                None => warn!("已启用本地歌词源，但未找到相关配置"),
            },
            _ => {
                warn!("未知的歌词源: {}", source);
            }
        }
    }

    info!("成功加载 {} 个歌词提供者", providers.len());
    for (i, provider) in providers.iter().enumerate() {
        debug!("歌词提供者 #{}: {}", i + 1, provider.name());
    }

    providers
}

/// 按顺序尝试各个歌词提供者，返回第一个找到的结果
///
/// 全部确认没有时返回 `Ok(None)`；有提供者出错且没有任何结果时返回最后一个错误，
/// 调用方据此区分“没有歌词”与“查询失败”。
pub struct ProviderChain {
    providers: Vec<Arc<dyn LyricsProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(get_enabled_providers(config))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl LyricsSource for ProviderChain {
    async fn search(&self, query: &str) -> Result<Option<String>, LyricsError> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.search_lyrics(query).await {
                Ok(Some(text)) => {
                    info!("从 {} 获取到歌词", provider.name());
                    return Ok(Some(text));
                }
                Ok(None) => debug!("{} 没有找到歌词", provider.name()),
                Err(e) => {
                    warn!("歌词源 {} 查询失败: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Reply {
        Found(&'static str),
        Missing,
        Broken,
    }

    struct FixedProvider {
        name: &'static str,
        reply: Reply,
    }

    #[async_trait]
    impl LyricsProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search_lyrics(&self, _query: &str) -> Result<Option<String>, LyricsError> {
            match self.reply {
                Reply::Found(text) => Ok(Some(text.to_string())),
                Reply::Missing => Ok(None),
                Reply::Broken => Err(LyricsError::Provider {
                    provider: self.name.to_string(),
                    reason: "boom".to_string(),
                }),
            }
        }
    }

    fn chain(replies: Vec<Reply>) -> ProviderChain {
        ProviderChain::new(
            replies
                .into_iter()
                .map(|reply| Arc::new(FixedProvider { name: "fixed", reply }) as Arc<dyn LyricsProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_first_found_wins_even_after_error() {
        let result = chain(vec![Reply::Broken, Reply::Missing, Reply::Found("a"), Reply::Found("b")])
            .search("q")
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_all_missing_is_not_found() {
        assert_eq!(chain(vec![Reply::Missing, Reply::Missing]).search("q").await.unwrap(), None);
        assert_eq!(chain(vec![]).search("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_without_result_is_failure() {
        assert!(chain(vec![Reply::Missing, Reply::Broken]).search("q").await.is_err());
    }

    #[test]
    fn test_unknown_sources_are_skipped() {
        let mut config = Config::default();
        config.lyrics_sources = vec!["local".to_string(), "netease".to_string()];
        assert_eq!(ProviderChain::from_config(&config).len(), 1);
    }
}
