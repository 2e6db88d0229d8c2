use std::time::{Duration, Instant};

use crate::mpris::{PlaybackStatus, PlayerState};

/// 一次同步得到的播放位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSnapshot {
    pub position_secs: f64,
    pub captured_at: Instant,
    pub rate: f64,
    pub status: PlaybackStatus,
}

impl PositionSnapshot {
    pub fn from_state(state: &PlayerState, captured_at: Instant) -> Self {
        Self {
            position_secs: state.position_secs,
            captured_at,
            rate: state.rate,
            status: state.status,
        }
    }
}

/// 在两次控制面读取之间估算播放位置
#[derive(Debug)]
pub struct PositionInterpolator {
    sync_interval: Duration,
    last_snapshot: Option<PositionSnapshot>,
    last_sync_at: Option<Instant>,
    needs_sync: bool,
}

impl PositionInterpolator {
    pub fn new(sync_interval: Duration) -> Self {
        Self {
            sync_interval,
            last_snapshot: None,
            last_sync_at: None,
            needs_sync: false,
        }
    }

    pub fn should_sync(&self, now: Instant) -> bool {
        match (self.last_snapshot, self.last_sync_at) {
            (Some(_), Some(last)) => {
                self.needs_sync || now.saturating_duration_since(last) >= self.sync_interval
            }
            _ => true,
        }
    }

    pub fn sync(&mut self, snapshot: PositionSnapshot) {
        self.last_sync_at = Some(snapshot.captured_at);
        self.last_snapshot = Some(snapshot);
        self.needs_sync = false;
    }

    /// 估算 `now` 时刻的播放位置（秒）
    ///
    /// 非播放状态下位置冻结在快照值。
    pub fn position_at(&self, now: Instant) -> f64 {
        let Some(snapshot) = self.last_snapshot else {
            return 0.0;
        };

        if snapshot.status != PlaybackStatus::Playing {
            return snapshot.position_secs;
        }

        let elapsed = now.saturating_duration_since(snapshot.captured_at).as_secs_f64();
        (snapshot.position_secs + elapsed * snapshot.rate).max(0.0)
    }

    /// 下一个 tick 立即同步（跳转、切歌时调用）
    pub fn force_resync(&mut self) {
        self.needs_sync = true;
    }

    /// 丢弃快照，用于播放器失效后
    pub fn clear(&mut self) {
        self.last_snapshot = None;
        self.last_sync_at = None;
        self.needs_sync = false;
    }
}
