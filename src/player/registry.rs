use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::mpris::{MediaControl, MprisError, PlayerState};

/// 当前播放器的句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerHandle {
    /// D-Bus 总线名
    pub address: String,
    /// 播放器 Identity
    pub identity: String,
    /// 在优先级列表中的位置，越小优先级越高
    pub rank: usize,
}

/// 播放器注册表
/// 负责发现播放器、按优先级仲裁，并持有唯一的当前播放器句柄
pub struct PlayerRegistry {
    control: Arc<dyn MediaControl>,
    priority: Vec<String>,
    promotion_interval: Duration,
    current: Option<PlayerHandle>,
    last_promotion_check: Option<Instant>,
}

impl PlayerRegistry {
    pub fn new(
        control: Arc<dyn MediaControl>,
        priority: Vec<String>,
        promotion_interval: Duration,
    ) -> Self {
        let priority = priority.into_iter().map(|name| name.to_lowercase()).collect();
        Self {
            control,
            priority,
            promotion_interval,
            current: None,
            last_promotion_check: None,
        }
    }

    pub fn current(&self) -> Option<&PlayerHandle> {
        self.current.as_ref()
    }

    /// 按优先级发现播放中或暂停的播放器
    pub async fn discover(&self) -> Option<PlayerHandle> {
        self.find_ranked(self.priority.len()).await
    }

    /// 只在优先级前 `upto` 项中查找
    ///
    /// 总线不可达时返回 None；单个播放器探测失败只跳过该播放器。
    async fn find_ranked(&self, upto: usize) -> Option<PlayerHandle> {
        let addresses = match self.control.list_players().await {
            Ok(addresses) => addresses,
            Err(e) => {
                debug!("无法枚举播放器: {}", e);
                return None;
            }
        };

        let mut candidates = Vec::new();
        for address in addresses {
            let identity = match self.control.identity(&address).await {
                Ok(identity) => identity,
                Err(e) => {
                    debug!("读取 {} 的 Identity 失败: {}", address, e);
                    continue;
                }
            };
            if self.rank_of(&identity).is_none_or(|rank| rank >= upto) {
                continue;
            }
            match self.control.status(&address).await {
                Ok(status) if status.is_active() => candidates.push((address, identity)),
                Ok(_) => {}
                Err(e) => debug!("读取 {} 的播放状态失败: {}", address, e),
            }
        }

        for (rank, name) in self.priority.iter().take(upto).enumerate() {
            if let Some((address, identity)) = candidates
                .iter()
                .find(|(_, identity)| identity.to_lowercase().contains(name.as_str()))
            {
                return Some(PlayerHandle {
                    address: address.clone(),
                    identity: identity.clone(),
                    rank,
                });
            }
        }

        None
    }

    /// Identity 匹配的最高优先级
    fn rank_of(&self, identity: &str) -> Option<usize> {
        let identity = identity.to_lowercase();
        self.priority
            .iter()
            .position(|name| identity.contains(name.as_str()))
    }

    /// 探测句柄是否仍然有效
    pub async fn is_alive(&self, handle: &PlayerHandle) -> bool {
        self.control.status(&handle.address).await.is_ok()
    }

    /// 确保有一个可用的当前播放器，必要时重新发现
    pub async fn ensure_player(&mut self) -> Option<PlayerHandle> {
        if let Some(handle) = &self.current {
            if self.is_alive(handle).await {
                return self.current.clone();
            }
            info!("播放器 {} 已失效", handle.address);
            self.current = None;
        }

        let found = self.discover().await;
        if let Some(handle) = &found {
            info!("选中播放器: {} ({})", handle.identity, handle.address);
        }
        self.current = found.clone();
        found
    }

    /// 定期检查是否有更高优先级的播放器
    ///
    /// 找到时替换当前句柄并返回新句柄，调用方需要重置会话。
    pub async fn maybe_promote(&mut self, now: Instant) -> Option<PlayerHandle> {
        if let Some(last) = self.last_promotion_check {
            if now.saturating_duration_since(last) < self.promotion_interval {
                return None;
            }
        }
        self.last_promotion_check = Some(now);

        let current = self.current.clone()?;

        let rank = match self.control.identity(&current.address).await {
            Ok(identity) => self.rank_of(&identity),
            Err(e) => {
                debug!("无法读取当前播放器 Identity: {}", e);
                None
            }
        };
        let Some(rank) = rank else {
            info!("当前播放器 {} 不再匹配优先级列表，重新发现", current.address);
            self.current = None;
            return None;
        };

        if rank == 0 {
            return None;
        }

        let better = self.find_ranked(rank).await?;
        if better.address == current.address {
            return None;
        }

        info!(
            "[播放器切换] 发现更高优先级的播放器: {} -> {}",
            current.identity, better.identity
        );
        self.current = Some(better.clone());
        Some(better)
    }

    /// 读取播放器状态，失败时由调用方释放句柄
    pub async fn fetch_state(&self, handle: &PlayerHandle) -> Result<PlayerState, MprisError> {
        self.control.fetch_state(&handle.address).await
    }

    /// 自上次检查以来当前播放器是否发出过 Seeked 信号
    pub async fn seeked(&self) -> bool {
        match &self.current {
            Some(handle) => self.control.seeked(&handle.address).await,
            None => false,
        }
    }

    /// 放弃当前播放器
    pub fn release(&mut self) {
        if let Some(handle) = self.current.take() {
            warn!("释放播放器: {} ({})", handle.identity, handle.address);
        }
    }
}
