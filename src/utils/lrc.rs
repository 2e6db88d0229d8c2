use regex::Regex;
use std::sync::LazyLock;

// 时间标签: [mm:ss] [mm:ss.x] [mm:ss.xx] [mm:ss.xxx]
static TIME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+):(\d{1,2}(?:\.\d{1,3})?)\]").expect("时间标签正则"));

// 元数据: [ar:艺术家]，只认标准 LRC 头部标签
static META_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[(ar|ti|al|au|by|re|ve|la|id|length|offset|tool|#):(.*)\]$")
        .expect("元数据正则")
});

/// 一行歌词：开始时间（秒，无时间标签时为 None）与文本
pub type LrcLine = (Option<f64>, String);

/// LRC歌词解析器
pub struct LrcParser;

impl LrcParser {
    /// 解析LRC格式的歌词，返回按原始顺序排列的歌词行和元数据
    ///
    /// 没有时间标签的行原样保留，空行保留为空文本。
    /// 一行带多个时间标签时取第一个作为开始时间。
    pub fn parse(content: &str) -> (Vec<LrcLine>, Vec<(String, String)>) {
        let mut lines = Vec::new();
        let mut metadata = Vec::new();

        for raw in content.trim().lines() {
            let line = raw.trim();

            if let Some(cap) = META_TAG.captures(line) {
                metadata.push((cap[1].to_string(), cap[2].trim().to_string()));
                continue;
            }

            let mut rest = line;
            let mut start = None;
            while let Some(cap) = TIME_TAG.captures(rest) {
                if start.is_none() {
                    start = Self::parse_timestamp(&cap[1], &cap[2]);
                }
                rest = &rest[cap[0].len()..];
            }

            match start {
                Some(seconds) => lines.push((Some(seconds), rest.trim().to_string())),
                None => lines.push((None, line.to_string())),
            }
        }

        (lines, metadata)
    }

    /// `mm` 与 `ss.xx` 转换为秒
    fn parse_timestamp(minutes: &str, seconds: &str) -> Option<f64> {
        let minutes = minutes.parse::<f64>().ok()?;
        let seconds = seconds.parse::<f64>().ok()?;
        Some(minutes * 60.0 + seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrc_parser() {
        let lrc_content = r#"[ar:周杰伦]
[ti:稻香]
[al:魔杰座]
[by:Lyrics by JimChou]
[00:00.00]周杰伦 - 稻香
[00:03.33]词：周杰伦
[00:05.76]曲：周杰伦
[00:09.86]对这个世界如果你有太多的抱怨
[00:13.96]跌倒了就不敢继续往前走
[00:18.10]为什么人要这么的脆弱 堕落"#;

        let (lines, metadata) = LrcParser::parse(lrc_content);

        // 验证元数据
        assert_eq!(metadata.len(), 4);
        assert!(metadata.contains(&("ar".to_string(), "周杰伦".to_string())));
        assert!(metadata.contains(&("ti".to_string(), "稻香".to_string())));

        // 验证歌词行
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], (Some(0.0), "周杰伦 - 稻香".to_string()));
        assert_eq!(lines[1].0, Some(3.33));
        assert_eq!(lines[5].1, "为什么人要这么的脆弱 堕落");
    }

    #[test]
    fn test_timestamp_precision_variants() {
        let (lines, _) = LrcParser::parse("[01:02]a\n[01:02.5]b\n[01:02.500]c\n[10:00.01]d");
        assert_eq!(lines[0].0, Some(62.0));
        assert_eq!(lines[1].0, Some(62.5));
        assert_eq!(lines[2].0, Some(62.5));
        assert_eq!(lines[3].0, Some(600.01));
    }

    #[test]
    fn test_multiple_tags_and_untagged_lines() {
        let (lines, _) = LrcParser::parse("[00:01.00][00:30.00]副歌\n\n普通的一行");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], (Some(1.0), "副歌".to_string()));
        assert_eq!(lines[1], (None, String::new()));
        assert_eq!(lines[2], (None, "普通的一行".to_string()));
    }

    #[test]
    fn test_only_known_header_tags_are_metadata() {
        let (lines, metadata) =
            LrcParser::parse("[ar:someone]\n[Chorus:x]\n[offset:+200]\n[00:01.00]a");
        assert_eq!(
            metadata,
            vec![
                ("ar".to_string(), "someone".to_string()),
                ("offset".to_string(), "+200".to_string()),
            ]
        );
        assert_eq!(lines[0], (None, "[Chorus:x]".to_string()));
        assert_eq!(lines[1], (Some(1.0), "a".to_string()));
    }
}
