use clap::ValueEnum;
use serde_json::json;

use crate::display::{render, DaemonSnapshot, SnapshotStatus, ViewOptions};
use crate::lyrics::LyricsDocument;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `{status, lines}`，供 Eww 等组件使用
    #[default]
    Json,
    /// Waybar 自定义模块
    Waybar,
    /// 终端文本
    Text,
    /// 原始歌词
    Raw,
}

const WAYBAR_ICON: &str = "󰎆";
const WAYBAR_GLYPH: &str = "♪";
const WAYBAR_ELISION: &str = "... (以下省略)";

impl OutputFormat {
    /// 各格式对应的窗口参数
    pub fn view_options(self) -> ViewOptions {
        match self {
            OutputFormat::Waybar => ViewOptions {
                radius: 2,
                unsynced_limit: 20,
                silence_glyph: Some(WAYBAR_GLYPH.to_string()),
                fallback_to_first: false,
            },
            _ => ViewOptions::default(),
        }
    }
}

/// HTML 转义（Waybar 使用 Pango 标记）
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_json(snapshot: &DaemonSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}

pub fn format_waybar(snapshot: &DaemonSnapshot) -> String {
    let hidden = |tooltip: &str| json!({"text": "", "class": "hidden", "tooltip": tooltip});

    let value = match snapshot.status {
        SnapshotStatus::Stopped => hidden("No active player"),
        SnapshotStatus::NoInfo => hidden("No track info"),
        SnapshotStatus::NoLyrics => hidden("No lyrics found"),
        SnapshotStatus::Ok => {
            let mut tooltip: Vec<String> = snapshot
                .lines
                .iter()
                .map(|line| {
                    let marker = if line.current { "▶ " } else { "  " };
                    format!("{}{}", marker, line.text)
                })
                .collect();
            if snapshot.truncated {
                tooltip.push(WAYBAR_ELISION.to_string());
            }
            let tooltip = if tooltip.is_empty() {
                WAYBAR_GLYPH.to_string()
            } else {
                tooltip.join("\n")
            };

            let text = match snapshot.current_text() {
                Some(current) => format!("{} {}", WAYBAR_ICON, current),
                None => WAYBAR_ICON.to_string(),
            };

            json!({
                "text": escape_html(&text),
                "class": "visible",
                "tooltip": escape_html(&tooltip),
            })
        }
    };

    value.to_string()
}

/// 终端文本：标题行、分隔线，然后是全部歌词，当前行以 `-->` 标出
pub fn format_text(
    document: &LyricsDocument,
    position: f64,
    title: &str,
    artist: &str,
    player: &str,
) -> String {
    let mut output = vec![
        format!("Now Playing: {} - {} ({})", title, artist, player),
        "-".repeat(40),
    ];

    let active = if document.is_synced() {
        document.active_index(position)
    } else {
        None
    };

    for (i, line) in document.lines().iter().enumerate() {
        if !document.is_synced() {
            output.push(line.text.clone());
        } else if Some(i) == active {
            output.push(format!("--> {}", line.text));
        } else {
            output.push(format!("    {}", line.text));
        }
    }

    output.join("\n")
}

/// 按格式渲染一次查询结果
pub fn format_snapshot(
    format: OutputFormat,
    document: &LyricsDocument,
    position: f64,
) -> String {
    let snapshot = render(document, position, &format.view_options());
    match format {
        OutputFormat::Waybar => format_waybar(&snapshot),
        _ => format_json(&snapshot).unwrap_or_default(),
    }
}
