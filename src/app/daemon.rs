use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::app::output::SnapshotWriter;
use crate::config::Config;
use crate::display::{render, DaemonSnapshot, ViewOptions};
use crate::lyrics::{LyricsSource, TrackCache};
use crate::mpris::{MediaControl, PlaybackStatus};
use crate::player::{PlayerRegistry, PositionInterpolator, PositionSnapshot, TrackSession};

/// 守护进程主循环
///
/// 以固定周期（默认 50 ms）运行，每个 tick 发布一次快照。
pub struct DaemonLoop {
    registry: PlayerRegistry,
    interpolator: PositionInterpolator,
    session: TrackSession,
    writer: SnapshotWriter,
    view: ViewOptions,
    tick_interval: Duration,
    active_address: Option<String>,
    last_status: Option<PlaybackStatus>,
}

impl DaemonLoop {
    pub fn new(
        registry: PlayerRegistry,
        interpolator: PositionInterpolator,
        session: TrackSession,
        writer: SnapshotWriter,
        view: ViewOptions,
        tick_interval: Duration,
    ) -> Self {
        Self {
            registry,
            interpolator,
            session,
            writer,
            view,
            tick_interval,
            active_address: None,
            last_status: None,
        }
    }

    /// 按配置组装各个组件
    pub fn from_config(
        config: &Config,
        priority: Vec<String>,
        control: Arc<dyn MediaControl>,
        source: Arc<dyn LyricsSource>,
    ) -> Self {
        let daemon = &config.daemon;
        let view = ViewOptions {
            radius: daemon.window_radius,
            silence_glyph: daemon.silence_glyph.clone(),
            ..ViewOptions::default()
        };

        Self::new(
            PlayerRegistry::new(control, priority, daemon.priority_check_interval()),
            PositionInterpolator::new(daemon.sync_interval()),
            TrackSession::new(TrackCache::new(&config.cache, source)),
            SnapshotWriter::new(daemon.output_path.clone()),
            view,
            daemon.tick_interval(),
        )
    }

    pub fn session(&self) -> &TrackSession {
        &self.session
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// 运行直到 `running` 被清除
    pub async fn run(&mut self, running: Arc<AtomicBool>) {
        info!("守护进程启动，输出文件: {:?}", self.writer.path());

        while running.load(Ordering::SeqCst) {
            let started = Instant::now();

            if let Err(e) = self.tick(started).await {
                error!("本轮处理失败: {:#}", e);
            }

            let remaining = self.tick_interval.saturating_sub(started.elapsed());
            tokio::time::sleep(remaining).await;
        }

        info!("守护进程退出");
    }

    /// 执行一个 tick，返回本轮发布的快照
    ///
    /// 读取播放器状态失败时释放句柄且本轮不发布。
    pub async fn tick(&mut self, now: Instant) -> Result<Option<DaemonSnapshot>> {
        if self.registry.maybe_promote(now).await.is_some() {
            self.session.forget();
            self.interpolator.force_resync();
        }

        let Some(handle) = self.registry.ensure_player().await else {
            if self.active_address.take().is_some() {
                info!("没有可用的播放器");
            }
            self.interpolator.clear();
            self.last_status = None;
            return self.publish(DaemonSnapshot::stopped()).map(Some);
        };

        if self.active_address.as_deref() != Some(handle.address.as_str()) {
            debug!("当前播放器变为 {}", handle.address);
            self.active_address = Some(handle.address.clone());
            self.interpolator.force_resync();
        }

        if self.registry.seeked().await {
            debug!("检测到跳转");
            self.interpolator.force_resync();
        }

        if self.interpolator.should_sync(now) {
            let state = match self.registry.fetch_state(&handle).await {
                Ok(state) => state,
                Err(e) => {
                    warn!("读取播放器状态失败: {}", e);
                    self.registry.release();
                    self.active_address = None;
                    self.interpolator.clear();
                    return Ok(None);
                }
            };

            if self.last_status != Some(state.status) {
                info!("播放状态: {} ({})", state.status, handle.identity);
                self.last_status = Some(state.status);
            }

            if state.status == PlaybackStatus::Stopped {
                self.registry.release();
                self.active_address = None;
                self.interpolator.clear();
                return self.publish(DaemonSnapshot::stopped()).map(Some);
            }

            let changed = self.session.has_changed(&state.track);
            if changed {
                self.session.adopt(state.track.clone(), &handle.identity).await;
            }

            self.interpolator.sync(PositionSnapshot::from_state(&state, now));
            if changed {
                // 歌词查询可能阻塞较久，下一个 tick 重新取一次位置
                self.interpolator.force_resync();
            }
        }

        let snapshot = if self.session.title_missing() {
            DaemonSnapshot::no_info()
        } else {
            let position = self.interpolator.position_at(now);
            render(self.session.document(), position, &self.view)
        };

        self.publish(snapshot).map(Some)
    }

    fn publish(&self, snapshot: DaemonSnapshot) -> Result<DaemonSnapshot> {
        self.writer.publish(&snapshot)?;
        Ok(snapshot)
    }
}
