use std::fmt;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlaybackStatus {
    /// 解析 MPRIS `PlaybackStatus` 属性，未知取值视为停止
    pub fn from_mpris(value: &str) -> Self {
        match value {
            "Playing" => PlaybackStatus::Playing,
            "Paused" => PlaybackStatus::Paused,
            _ => PlaybackStatus::Stopped,
        }
    }

    /// 是否可以被选为当前播放器（播放中或暂停）
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackStatus::Playing | PlaybackStatus::Paused)
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// 轨道身份，用于切歌检测
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackIdentity {
    /// `mpris:trackid`，部分播放器不提供，可能为空
    pub track_id: String,
    /// 歌曲标题
    pub title: String,
    /// 艺术家（多个艺术家以 ", " 连接）
    pub artist: String,
}

impl TrackIdentity {
    pub fn new(
        track_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            title: title.into(),
            artist: artist.into(),
        }
    }
}

/// 一次控制面读取得到的播放器状态
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub status: PlaybackStatus,
    /// 播放位置（秒）
    pub position_secs: f64,
    /// 播放速率
    pub rate: f64,
    pub track: TrackIdentity,
    /// 歌曲时长（秒），未知时为 0
    pub length_secs: f64,
}
