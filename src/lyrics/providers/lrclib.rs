use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::LrclibConfig;
use crate::lyrics::{LyricsError, LyricsProvider};
use crate::utils::string_similarity;

/// LRCLIB 搜索结果，只保留用到的字段
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrclibRecord {
    id: i64,
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    instrumental: bool,
    plain_lyrics: Option<String>,
    synced_lyrics: Option<String>,
}

impl LrclibRecord {
    fn synced(&self) -> Option<&str> {
        self.synced_lyrics.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn plain(&self) -> Option<&str> {
        self.plain_lyrics.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// LRCLIB 歌词提供者
pub struct LrclibProvider {
    client: Client,
    base_url: String,
}

impl LrclibProvider {
    pub fn new(config: LrclibConfig) -> Result<Self, LyricsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// 优先带时间轴的歌词，其次按曲名与关键字的相似度排序
fn pick_best(records: &[LrclibRecord], query: &str) -> Option<String> {
    let score = |record: &LrclibRecord| {
        string_similarity(
            &format!("{} {}", record.track_name, record.artist_name),
            query,
        )
    };

    let best_synced = records
        .iter()
        .filter(|r| !r.instrumental && r.synced().is_some())
        .max_by(|a, b| score(a).total_cmp(&score(b)));

    if let Some(record) = best_synced {
        debug!("LRCLIB 选中带时间轴的歌词 (id: {})", record.id);
        return record.synced().map(str::to_string);
    }

    records
        .iter()
        .filter(|r| !r.instrumental && r.plain().is_some())
        .max_by(|a, b| score(a).total_cmp(&score(b)))
        .and_then(|record| {
            debug!("LRCLIB 只有纯文本歌词 (id: {})", record.id);
            record.plain().map(str::to_string)
        })
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &str {
        "lrclib"
    }

    async fn search_lyrics(&self, query: &str) -> Result<Option<String>, LyricsError> {
        let url = format!("{}/search", self.base_url);
        debug!("LRCLIB GET {} q={}", url, query);

        let response = self.client.get(&url).query(&[("q", query)]).send().await?;
        if !response.status().is_success() {
            warn!("LRCLIB 返回状态码: {}", response.status());
            return Err(LyricsError::Provider {
                provider: self.name().to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let records: Vec<LrclibRecord> = response.json().await?;
        info!("LRCLIB 返回 {} 条结果", records.len());

        Ok(pick_best(&records, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(json: &str) -> Vec<LrclibRecord> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_synced_preferred_over_closer_plain_match() {
        let list = records(
            r#"[
                {"id": 1, "trackName": "Song", "artistName": "Band", "instrumental": false,
                 "plainLyrics": "plain text", "syncedLyrics": null},
                {"id": 2, "trackName": "Song (Cover)", "artistName": "Other", "instrumental": false,
                 "plainLyrics": "x", "syncedLyrics": "[00:01.00]x"}
            ]"#,
        );
        assert_eq!(pick_best(&list, "Song Band").as_deref(), Some("[00:01.00]x"));
    }

    #[test]
    fn test_best_synced_match_by_similarity() {
        let list = records(
            r#"[
                {"id": 1, "trackName": "Something Else", "artistName": "Nobody",
                 "syncedLyrics": "[00:01.00]wrong"},
                {"id": 2, "trackName": "Song", "artistName": "Band",
                 "syncedLyrics": "[00:01.00]right"}
            ]"#,
        );
        assert_eq!(pick_best(&list, "Song Band").as_deref(), Some("[00:01.00]right"));
    }

    #[test]
    fn test_instrumental_and_blank_are_not_found() {
        let list = records(
            r#"[
                {"id": 1, "trackName": "Song", "artistName": "Band", "instrumental": true,
                 "syncedLyrics": "[00:01.00]x"},
                {"id": 2, "trackName": "Song", "artistName": "Band",
                 "plainLyrics": "  ", "syncedLyrics": ""}
            ]"#,
        );
        assert_eq!(pick_best(&list, "Song Band"), None);
        assert_eq!(pick_best(&[], "Song Band"), None);
    }
}
