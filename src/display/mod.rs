// 输出视图与各消费端格式

mod formatter;
mod view;

pub use formatter::{
    escape_html, format_json, format_snapshot, format_text, format_waybar, OutputFormat,
};
pub use view::{render, DaemonSnapshot, SnapshotStatus, ViewOptions, WindowLine};
