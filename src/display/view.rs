use serde::{Deserialize, Serialize};

use crate::lyrics::LyricsDocument;

/// 快照状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Stopped,
    NoLyrics,
    NoInfo,
    Ok,
}

/// 窗口中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowLine {
    pub text: String,
    pub current: bool,
}

/// 守护进程每个 tick 发布的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonSnapshot {
    pub status: SnapshotStatus,
    pub lines: Vec<WindowLine>,
    /// 未同步歌词被截断
    #[serde(skip)]
    pub truncated: bool,
}

impl DaemonSnapshot {
    fn empty(status: SnapshotStatus) -> Self {
        Self {
            status,
            lines: Vec::new(),
            truncated: false,
        }
    }

    pub fn stopped() -> Self {
        Self::empty(SnapshotStatus::Stopped)
    }

    pub fn no_lyrics() -> Self {
        Self::empty(SnapshotStatus::NoLyrics)
    }

    pub fn no_info() -> Self {
        Self::empty(SnapshotStatus::NoInfo)
    }

    /// 当前行文本
    pub fn current_text(&self) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.current)
            .map(|line| line.text.as_str())
    }
}

/// 渲染参数
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// 当前行前后各显示的行数
    pub radius: usize,
    /// 未同步歌词最多显示的行数
    pub unsynced_limit: usize,
    /// 当前行为空时的占位符
    pub silence_glyph: Option<String>,
    /// 播放位置早于第一个时间标签时是否以第一行为当前行
    pub fallback_to_first: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            radius: 3,
            unsynced_limit: 10,
            silence_glyph: None,
            fallback_to_first: true,
        }
    }
}

/// 把歌词与播放位置渲染成有限行数的窗口
pub fn render(document: &LyricsDocument, position: f64, options: &ViewOptions) -> DaemonSnapshot {
    if document.is_empty() {
        return DaemonSnapshot::no_lyrics();
    }

    if !document.is_synced() {
        let visible: Vec<&str> = document
            .lines()
            .iter()
            .map(|line| line.text.trim())
            .filter(|text| !text.is_empty())
            .collect();
        let lines = visible
            .iter()
            .take(options.unsynced_limit)
            .map(|text| WindowLine {
                text: text.to_string(),
                current: false,
            })
            .collect();
        return DaemonSnapshot {
            status: SnapshotStatus::Ok,
            lines,
            truncated: visible.len() > options.unsynced_limit,
        };
    }

    let active = document
        .active_index(position)
        .or_else(|| options.fallback_to_first.then_some(0));
    let Some(active) = active else {
        return DaemonSnapshot::empty(SnapshotStatus::Ok);
    };

    let all = document.lines();
    let start = active.saturating_sub(options.radius);
    let end = (active + options.radius + 1).min(all.len());

    let lines = (start..end)
        .filter_map(|i| {
            let text = all[i].text.trim();
            let current = i == active;
            let shown = match (text.is_empty(), current) {
                (false, _) => Some(text.to_string()),
                (true, true) => options.silence_glyph.clone(),
                (true, false) => None,
            };
            shown.map(|text| WindowLine { text, current })
        })
        .collect();

    DaemonSnapshot {
        status: SnapshotStatus::Ok,
        lines,
        truncated: false,
    }
}
