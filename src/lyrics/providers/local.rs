use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::LocalConfig;
use crate::lyrics::{LyricsError, LyricsProvider};
use crate::utils::string_similarity;

/// 模糊匹配的最低相似度
const MATCH_THRESHOLD: f64 = 0.6;

/// 本地歌词文件提供者
pub struct LocalProvider {
    // 歌词目录的绝对路径
    lyrics_path: PathBuf,
}

impl LocalProvider {
    /// 创建新的本地歌词提供者
    pub fn new(config: LocalConfig) -> Self {
        // 处理路径，将~替换为用户家目录
        let lyrics_path = match config.lyrics_path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest),
            None => PathBuf::from(&config.lyrics_path),
        };

        Self { lyrics_path }
    }

    /// 在歌词目录中查找与关键字最接近的 LRC 文件
    fn find_matching_lrc(&self, query: &str) -> Result<Option<PathBuf>, LyricsError> {
        if !self.lyrics_path.is_dir() {
            debug!("歌词目录不存在或不是目录: {:?}", self.lyrics_path);
            return Ok(None);
        }

        let wanted = query.to_lowercase();
        let mut best: Option<(f64, PathBuf)> = None;

        for entry in fs::read_dir(&self.lyrics_path)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "lrc") {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
                continue;
            };

            if stem == wanted {
                debug!("找到精确匹配的歌词文件: {:?}", path);
                return Ok(Some(path));
            }

            let score = string_similarity(&stem, &wanted);
            if score > MATCH_THRESHOLD && best.as_ref().is_none_or(|(s, _)| score > *s) {
                best = Some((score, path));
            }
        }

        Ok(best.map(|(score, path)| {
            debug!("找到模糊匹配的歌词文件: {:?}, 评分: {:.2}", path, score);
            path
        }))
    }
}

#[async_trait]
impl LyricsProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn search_lyrics(&self, query: &str) -> Result<Option<String>, LyricsError> {
        if query.trim().is_empty() {
            return Ok(None);
        }

        let Some(path) = self.find_matching_lrc(query)? else {
            return Ok(None);
        };

        match fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                info!("成功加载本地歌词: {:?}", path);
                Ok(Some(content))
            }
            Ok(_) => {
                debug!("本地歌词文件为空: {:?}", path);
                Ok(None)
            }
            Err(e) => {
                warn!("读取本地歌词文件失败: {:?}: {}", path, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_in(name: &str) -> (LocalProvider, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "mpris-lyrics-local-{}-{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let provider = LocalProvider::new(LocalConfig {
            lyrics_path: dir.to_string_lossy().to_string(),
        });
        (provider, dir)
    }

    #[tokio::test]
    async fn test_exact_and_fuzzy_match() {
        let (provider, dir) = provider_in("match");
        fs::write(dir.join("Song Band.lrc"), "[00:01.00]exact").unwrap();
        fs::write(dir.join("Another Tune Band.lrc"), "[00:01.00]fuzzy").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(
            provider.search_lyrics("song band").await.unwrap().as_deref(),
            Some("[00:01.00]exact")
        );
        assert_eq!(
            provider.search_lyrics("Another Tune - Band").await.unwrap().as_deref(),
            Some("[00:01.00]fuzzy")
        );
        assert_eq!(provider.search_lyrics("zzzz qqqq").await.unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_an_error() {
        let provider = LocalProvider::new(LocalConfig {
            lyrics_path: "/nonexistent/mpris-lyrics-dir".to_string(),
        });
        assert_eq!(provider.search_lyrics("Song").await.unwrap(), None);
    }
}
