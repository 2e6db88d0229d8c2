//! 基于 zbus 的 MPRIS 访问层
//!
//! 每次调用都按需创建代理并直接读取属性，不缓存属性值，
//! 播放器退出导致的失败由调用方决定如何处理。

use std::collections::HashMap;
use std::ops::Deref;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::Mutex;
use tracing::debug;
use zbus::proxy::CacheProperties;
use zbus::zvariant::{OwnedValue, Value};
use zbus::Connection;

use crate::mpris::error::MprisError;
use crate::mpris::types::{PlaybackStatus, PlayerState, TrackIdentity};

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MprisPlayer {
    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> zbus::Result<i64>;

    #[zbus(property)]
    fn rate(&self) -> zbus::Result<f64>;

    #[zbus(signal)]
    fn seeked(&self, position: i64) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MprisRoot {
    #[zbus(property)]
    fn identity(&self) -> zbus::Result<String>;
}

/// 媒体控制能力接口
///
/// 守护进程只通过该接口访问播放器，任何调用都可能因为播放器中途退出而失败。
#[async_trait]
pub trait MediaControl: Send + Sync {
    /// 列出当前总线上所有播放器地址
    async fn list_players(&self) -> Result<Vec<String>, MprisError>;

    /// 读取播放器的 Identity
    async fn identity(&self, address: &str) -> Result<String, MprisError>;

    /// 读取播放状态，同时作为存活探测
    async fn status(&self, address: &str) -> Result<PlaybackStatus, MprisError>;

    /// 读取完整的播放状态与元数据
    async fn fetch_state(&self, address: &str) -> Result<PlayerState, MprisError>;

    /// 自上次调用以来该播放器是否发出过 Seeked 信号（非阻塞）
    async fn seeked(&self, _address: &str) -> bool {
        false
    }
}

/// 当前订阅的 Seeked 信号
struct SeekWatch {
    address: String,
    stream: BoxStream<'static, ()>,
}

/// 会话总线上的 MPRIS 实现
pub struct MprisBus {
    connection: Connection,
    seek_watch: Mutex<Option<SeekWatch>>,
}

impl MprisBus {
    /// 连接会话总线
    pub async fn connect() -> Result<Self, MprisError> {
        let connection = Connection::session().await?;
        debug!("已连接 D-Bus 会话总线");
        Ok(Self {
            connection,
            seek_watch: Mutex::new(None),
        })
    }

    async fn player_proxy(&self, address: &str) -> Result<MprisPlayerProxy<'static>, MprisError> {
        let proxy = MprisPlayerProxy::builder(&self.connection)
            .destination(address.to_owned())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy)
    }

    async fn subscribe_seeked(&self, address: &str) -> Result<BoxStream<'static, ()>, MprisError> {
        let proxy = self.player_proxy(address).await?;
        let stream = proxy.receive_seeked().await?;
        Ok(stream.map(|_| ()).boxed())
    }
}

#[async_trait]
impl MediaControl for MprisBus {
    async fn list_players(&self) -> Result<Vec<String>, MprisError> {
        let dbus_proxy = zbus::fdo::DBusProxy::new(&self.connection).await?;
        let names = dbus_proxy.list_names().await?;

        let mut players: Vec<String> = names
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name.starts_with(MPRIS_PREFIX))
            .collect();
        players.sort();
        Ok(players)
    }

    async fn identity(&self, address: &str) -> Result<String, MprisError> {
        let proxy = MprisRootProxy::builder(&self.connection)
            .destination(address.to_owned())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        proxy.identity().await.map_err(|e| classify(address, e))
    }

    async fn status(&self, address: &str) -> Result<PlaybackStatus, MprisError> {
        let proxy = self.player_proxy(address).await?;
        let status = proxy
            .playback_status()
            .await
            .map_err(|e| classify(address, e))?;
        Ok(PlaybackStatus::from_mpris(&status))
    }

    async fn fetch_state(&self, address: &str) -> Result<PlayerState, MprisError> {
        let proxy = self.player_proxy(address).await?;

        let status = proxy
            .playback_status()
            .await
            .map_err(|e| classify(address, e))?;
        let position_us = proxy.position().await.map_err(|e| classify(address, e))?;
        let metadata = proxy.metadata().await.map_err(|e| classify(address, e))?;
        // 不少播放器没有实现 Rate，按正常速率处理
        let rate = match proxy.rate().await {
            Ok(rate) => rate,
            Err(e) => {
                debug!("播放器 {} 未提供播放速率: {}", address, e);
                1.0
            }
        };

        Ok(PlayerState {
            status: PlaybackStatus::from_mpris(&status),
            position_secs: position_us as f64 / 1_000_000.0,
            rate,
            track: TrackIdentity {
                track_id: extract_track_id(&metadata).unwrap_or_default(),
                title: extract_string(&metadata, "xesam:title").unwrap_or_default(),
                artist: extract_artist(&metadata).unwrap_or_default(),
            },
            length_secs: extract_i64(&metadata, "mpris:length").unwrap_or(0) as f64 / 1_000_000.0,
        })
    }

    async fn seeked(&self, address: &str) -> bool {
        let mut guard = self.seek_watch.lock().await;

        let subscribed = guard.as_ref().is_some_and(|w| w.address == address);
        if !subscribed {
            // 切换了播放器，重新订阅；订阅之前的跳转不计
            *guard = match self.subscribe_seeked(address).await {
                Ok(stream) => Some(SeekWatch {
                    address: address.to_string(),
                    stream,
                }),
                Err(e) => {
                    debug!("订阅 {} 的 Seeked 信号失败: {}", address, e);
                    None
                }
            };
            return false;
        }

        let Some(watch) = guard.as_mut() else {
            return false;
        };

        let mut seen = false;
        let mut ended = false;
        loop {
            match watch.stream.next().now_or_never() {
                Some(Some(())) => seen = true,
                Some(None) => {
                    ended = true;
                    break;
                }
                None => break,
            }
        }
        if ended {
            // 信号流结束，播放器已退出
            *guard = None;
        }
        seen
    }
}

/// 将“服务不存在”归类为播放器断开
fn classify(address: &str, err: zbus::Error) -> MprisError {
    match &err {
        zbus::Error::MethodError(name, _, _) if name.as_str() == SERVICE_UNKNOWN => {
            MprisError::Disconnected(address.to_string())
        }
        _ => MprisError::DBus(err),
    }
}

fn extract_string(map: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    map.get(key).and_then(|v| match v.deref() {
        Value::Str(s) => Some(s.to_string()),
        _ => None,
    })
}

fn extract_i64(map: &HashMap<String, OwnedValue>, key: &str) -> Option<i64> {
    map.get(key).and_then(|v| match v.deref() {
        Value::I64(i) => Some(*i),
        Value::U64(u) => Some(*u as i64),
        Value::I32(i) => Some(*i as i64),
        Value::U32(u) => Some(*u as i64),
        _ => None,
    })
}

/// `xesam:artist` 规范上是字符串数组，但也有播放器直接给字符串
fn extract_artist(map: &HashMap<String, OwnedValue>) -> Option<String> {
    map.get("xesam:artist").and_then(|v| match v.deref() {
        Value::Str(s) => Some(s.to_string()),
        Value::Array(arr) => {
            let artists: Vec<String> = arr
                .iter()
                .filter_map(|item| match item {
                    Value::Str(s) => Some(s.to_string()),
                    _ => None,
                })
                .collect();
            Some(artists.join(", "))
        }
        _ => None,
    })
}

fn extract_track_id(map: &HashMap<String, OwnedValue>) -> Option<String> {
    map.get("mpris:trackid").and_then(|v| match v.deref() {
        Value::ObjectPath(p) => Some(p.to_string()),
        Value::Str(s) => Some(s.to_string()),
        _ => None,
    })
}
