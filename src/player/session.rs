use tracing::{debug, info};

use crate::lyrics::{cache_key, LyricsDocument, TrackCache};
use crate::mpris::TrackIdentity;
use crate::utils::TitleNormalizer;

/// 当前曲目会话
///
/// 记录正在播放的曲目，切歌时通过缓存解析一次歌词。
pub struct TrackSession {
    normalizer: TitleNormalizer,
    cache: TrackCache,
    identity: Option<TrackIdentity>,
    player_name: String,
    title: String,
    artist: String,
    text: String,
    document: LyricsDocument,
}

impl TrackSession {
    pub fn new(cache: TrackCache) -> Self {
        Self {
            normalizer: TitleNormalizer::new(),
            cache,
            identity: None,
            player_name: String::new(),
            title: String::new(),
            artist: String::new(),
            text: String::new(),
            document: LyricsDocument::empty(),
        }
    }

    /// 判断是否切歌
    pub fn has_changed(&self, new: &TrackIdentity) -> bool {
        match &self.identity {
            None => true,
            Some(current) => {
                (!new.track_id.is_empty() && new.track_id != current.track_id)
                    || new.title != current.title
                    || new.artist != current.artist
            }
        }
    }

    /// 切换到新曲目并解析歌词
    pub async fn adopt(&mut self, new: TrackIdentity, player_name: &str) {
        let (title, artist) = self.normalizer.canonicalize(&new.title, &new.artist, player_name);
        info!("切换曲目: {} - {} ({})", artist, title, player_name);

        self.identity = Some(new);
        self.player_name = player_name.to_string();

        let text = if title.is_empty() {
            debug!("标题为空，不查询歌词");
            String::new()
        } else {
            let key = cache_key(&artist, &title);
            self.cache.resolve_text(&artist, &title, &key).await
        };

        self.document = LyricsDocument::parse(&text);
        self.text = text;
        self.title = title;
        self.artist = artist;
    }

    /// 清除曲目身份，下次同步时重新解析
    pub fn forget(&mut self) {
        self.identity = None;
    }

    pub fn document(&self) -> &LyricsDocument {
        &self.document
    }

    /// 未解析的歌词文本
    pub fn lyrics_text(&self) -> &str {
        &self.text
    }

    /// 规范化后标题为空
    pub fn title_missing(&self) -> bool {
        self.identity.is_some() && self.title.is_empty()
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::lyrics::{LyricsError, LyricsSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct EchoSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LyricsSource for EchoSource {
        async fn search(&self, query: &str) -> Result<Option<String>, LyricsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(format!("[00:00.00]{}", query)))
        }
    }

    fn new_session(name: &str, source: Arc<EchoSource>) -> (TrackSession, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "mpris-lyrics-session-{}-{}",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let config = CacheConfig {
            directory: dir.clone(),
            ..CacheConfig::default()
        };
        (TrackSession::new(TrackCache::new(&config, source)), dir)
    }

    #[test]
    fn test_has_changed() {
        let (mut session, _) = new_session("changed", Arc::new(EchoSource::default()));
        let a = TrackIdentity::new("/track/1", "Song", "Band");
        assert!(session.has_changed(&a));

        session.identity = Some(a.clone());
        assert!(!session.has_changed(&a));
        assert!(session.has_changed(&TrackIdentity::new("/track/2", "Song", "Band")));
        assert!(session.has_changed(&TrackIdentity::new("/track/1", "Other", "Band")));
        // 新 track_id 为空时只比较标题与艺术家
        assert!(!session.has_changed(&TrackIdentity::new("", "Song", "Band")));
    }

    #[tokio::test]
    async fn test_adopt_resolves_canonical_title() {
        let source = Arc::new(EchoSource::default());
        let (mut session, dir) = new_session("adopt", source.clone());

        session
            .adopt(
                TrackIdentity::new("", "Song [Official MV]", "Band"),
                "org.mpris.MediaPlayer2.brave",
            )
            .await;

        assert_eq!(session.title(), "Song");
        assert_eq!(session.document().lines()[0].text, "Song Band");
        assert!(!session.title_missing());

        // 换一个播放器也命中同一个缓存条目
        session.forget();
        session
            .adopt(
                TrackIdentity::new("", "Song", "Band"),
                "org.mpris.MediaPlayer2.spotify",
            )
            .await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_empty_title_reports_missing() {
        let source = Arc::new(EchoSource::default());
        let (mut session, _) = new_session("empty", source.clone());

        session
            .adopt(TrackIdentity::new("", "[MV]", "Band"), "brave")
            .await;

        assert!(session.title_missing());
        assert!(session.document().is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
