use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Config;
use crate::display::{
    format_json, format_snapshot, format_text, format_waybar, DaemonSnapshot, OutputFormat,
};
use crate::lyrics::{LyricsSource, TrackCache};
use crate::mpris::MediaControl;
use crate::player::{PlayerRegistry, TrackSession};

/// 没有播放器、没有曲目信息、没有歌词时的输出
fn empty_output(format: OutputFormat, snapshot: DaemonSnapshot, message: &str) -> String {
    match format {
        OutputFormat::Json => format_json(&snapshot).unwrap_or_default(),
        OutputFormat::Waybar => format_waybar(&snapshot),
        OutputFormat::Text | OutputFormat::Raw => message.to_string(),
    }
}

/// 查询一次当前播放器的歌词并按格式输出
pub async fn query_once(
    config: &Config,
    priority: Vec<String>,
    format: OutputFormat,
    control: Arc<dyn MediaControl>,
    source: Arc<dyn LyricsSource>,
) -> String {
    let registry = PlayerRegistry::new(
        control,
        priority,
        config.daemon.priority_check_interval(),
    );

    let no_player = || empty_output(format, DaemonSnapshot::stopped(), "No active player found.");

    let Some(handle) = registry.discover().await else {
        return no_player();
    };

    let state = match registry.fetch_state(&handle).await {
        Ok(state) if state.status.is_active() => state,
        Ok(state) => {
            debug!("播放器 {} 状态为 {}", handle.identity, state.status);
            return no_player();
        }
        Err(e) => {
            warn!("读取播放器状态失败: {}", e);
            return no_player();
        }
    };

    let mut session = TrackSession::new(TrackCache::new(&config.cache, source));
    session.adopt(state.track.clone(), &handle.identity).await;

    if session.title_missing() {
        return empty_output(format, DaemonSnapshot::no_info(), "No track info available.");
    }

    if session.document().is_empty() {
        let message = format!(
            "Lyrics not found for: {} - {}",
            session.artist(),
            session.title()
        );
        return empty_output(format, DaemonSnapshot::no_lyrics(), &message);
    }

    match format {
        OutputFormat::Raw => session.lyrics_text().to_string(),
        OutputFormat::Text => format_text(
            session.document(),
            state.position_secs,
            session.title(),
            session.artist(),
            &handle.identity,
        ),
        _ => format_snapshot(format, session.document(), state.position_secs),
    }
}
