use crate::utils::LrcParser;

/// 表示单行歌词
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// 开始时间（秒），未带时间标签的行为 None
    pub start: Option<f64>,
    /// 歌词文本（已去掉时间标签）
    pub text: String,
}

/// 解析后的歌词文档
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsDocument {
    lines: Vec<LyricLine>,
    metadata: Vec<(String, String)>,
    synced: bool,
}

impl LyricsDocument {
    /// 空文档（确认无歌词，或尚未解析）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从歌词文本解析
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::empty();
        }

        let (parsed, metadata) = LrcParser::parse(text);
        let lines: Vec<LyricLine> = parsed
            .into_iter()
            .map(|(start, text)| LyricLine { start, text })
            .collect();
        let synced = lines.iter().any(|line| line.start.is_some());

        Self {
            lines,
            metadata,
            synced,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 是否为带时间轴的歌词
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// LRC 头部标签，如 `ar`、`ti`
    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// 查找当前播放位置对应的行
    ///
    /// 每个带时间的行覆盖 `[start_i, start_next)`，`start_next` 为其后第一个带时间的行，
    /// 最后一行延伸到无穷。位置早于第一个时间标签时返回 None。
    pub fn active_index(&self, position: f64) -> Option<usize> {
        let timed: Vec<(usize, f64)> = self
            .lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| line.start.map(|start| (i, start)))
            .collect();

        timed.iter().enumerate().find_map(|(k, &(index, start))| {
            let next = timed.get(k + 1).map_or(f64::INFINITY, |&(_, s)| s);
            (start <= position && position < next).then_some(index)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_index_half_open_intervals() {
        let doc = LyricsDocument::parse("[00:00.00]a\n[00:02.00]b\n[00:04.00]c");
        assert_eq!(doc.active_index(0.0), Some(0));
        assert_eq!(doc.active_index(1.99), Some(0));
        assert_eq!(doc.active_index(2.0), Some(1));
        assert_eq!(doc.active_index(2.5), Some(1));
        assert_eq!(doc.active_index(4.0), Some(2));
        assert_eq!(doc.active_index(1000.0), Some(2));
    }

    #[test]
    fn test_active_index_before_first_tag() {
        let doc = LyricsDocument::parse("[00:10.00]late start");
        assert_eq!(doc.active_index(3.0), None);
    }

    #[test]
    fn test_hello_world_scenario() {
        let doc = LyricsDocument::parse("[00:00.00]Hello\n[00:02.50]World");
        assert_eq!(doc.lines()[doc.active_index(1.0).unwrap()].text, "Hello");
        assert_eq!(doc.lines()[doc.active_index(3.0).unwrap()].text, "World");
        assert_eq!(doc.lines()[doc.active_index(10.0).unwrap()].text, "World");
    }

    #[test]
    fn test_untagged_lines_do_not_split_intervals() {
        let doc = LyricsDocument::parse("[00:01.00]a\n\n[00:05.00]b");
        assert_eq!(doc.lines().len(), 3);
        assert_eq!(doc.active_index(3.0), Some(0));
        assert_eq!(doc.active_index(5.5), Some(2));
    }

    #[test]
    fn test_header_tags_are_metadata() {
        let doc = LyricsDocument::parse("[ar:Band]\n[ti:Song]\n[00:01.00]first");
        assert_eq!(doc.lines().len(), 1);
        assert_eq!(doc.metadata()[1], ("ti".to_string(), "Song".to_string()));
    }

    #[test]
    fn test_plain_lyrics_are_unsynced() {
        let doc = LyricsDocument::parse("first\nsecond");
        assert!(!doc.is_synced());
        assert_eq!(doc.active_index(1.0), None);
        assert!(LyricsDocument::parse("   ").is_empty());
    }
}
