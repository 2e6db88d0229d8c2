use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 播放器优先级（按 Identity 子串匹配，不区分大小写，越靠前优先级越高）
    pub player_priority: Vec<String>,

    /// 启用的歌词源列表，按顺序尝试
    pub lyrics_sources: Vec<String>,

    /// 守护进程设置
    pub daemon: DaemonConfig,

    /// 歌词缓存设置
    pub cache: CacheConfig,

    /// 歌词源特定配置
    pub sources: SourcesConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DaemonConfig {
    /// 输出刷新周期（毫秒）
    pub tick_interval_ms: u64,

    /// 与播放器同步播放位置的间隔（秒）
    pub sync_interval_secs: f64,

    /// 检查更高优先级播放器的间隔（秒）
    pub priority_check_interval_secs: f64,

    /// 快照输出文件
    pub output_path: PathBuf,

    /// 进程 PID 文件
    pub pid_path: PathBuf,

    /// 当前行前后显示的行数
    pub window_radius: usize,

    /// 当前行为空行时显示的占位符，不设置则直接省略空行
    pub silence_glyph: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// 缓存目录
    pub directory: PathBuf,

    /// 艺术家名超过该长度（字符数）时，搜索只使用标题
    pub max_artist_query_len: usize,

    /// 艺术家名到搜索用名称的映射
    pub artist_search_mappings: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    /// LRCLIB 配置
    pub lrclib: Option<LrclibConfig>,

    /// 本地歌词文件配置
    pub local: Option<LocalConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LrclibConfig {
    /// API 地址
    pub base_url: String,

    /// 请求超时（秒）
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalConfig {
    /// 本地歌词目录路径
    pub lyrics_path: String,
}

impl DaemonConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn sync_interval(&self) -> Duration {
        seconds_or(self.sync_interval_secs, DEFAULT_INTERVAL_SECS)
    }

    pub fn priority_check_interval(&self) -> Duration {
        seconds_or(self.priority_check_interval_secs, DEFAULT_INTERVAL_SECS)
    }
}

const DEFAULT_INTERVAL_SECS: u64 = 5;

/// 负数取 0，超出 `Duration` 范围（如 inf）时回退到默认值
fn seconds_or(value: f64, default_secs: u64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or_else(|_| {
        warn!("间隔 {} 秒无效，使用默认值 {} 秒", value, default_secs);
        Duration::from_secs(default_secs)
    })
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let tmp = env::temp_dir();
        DaemonConfig {
            tick_interval_ms: 50,
            sync_interval_secs: 5.0,
            priority_check_interval_secs: 5.0,
            output_path: tmp.join("lyrics-daemon.json"),
            pid_path: tmp.join("lyrics-daemon.pid"),
            window_radius: 3,
            silence_glyph: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let pkg_name = env!("CARGO_PKG_NAME");
        let directory = dirs::cache_dir()
            .map(|p| p.join(pkg_name).join("lyrics"))
            .unwrap_or_else(|| env::temp_dir().join("lyrics_cache"));

        CacheConfig {
            directory,
            max_artist_query_len: 30,
            artist_search_mappings: [(
                "ずっと真夜中でいいのに。 ZUTOMAYO".to_string(),
                "ずっと真夜中でいいのに。".to_string(),
            )]
            .into_iter()
            .collect(),
        }
    }
}

impl Default for LrclibConfig {
    fn default() -> Self {
        LrclibConfig {
            base_url: "https://lrclib.net/api".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let pkg_name = env!("CARGO_PKG_NAME");
        let default_lyrics_path = dirs::config_dir()
            .map(|p| p.join(pkg_name).join("lyrics"))
            .unwrap_or_else(|| PathBuf::from("lyrics"));

        Config {
            player_priority: vec!["brave".to_string(), "spotify".to_string()],
            lyrics_sources: vec!["local".to_string(), "lrclib".to_string()],
            daemon: DaemonConfig::default(),
            cache: CacheConfig::default(),
            sources: SourcesConfig {
                lrclib: Some(LrclibConfig::default()),
                local: Some(LocalConfig {
                    lyrics_path: default_lyrics_path.to_string_lossy().to_string(),
                }),
            },
        }
    }
}

impl Config {
    /// 加载配置，支持从指定路径或默认路径加载
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let pkg_name = env!("CARGO_PKG_NAME");
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join(pkg_name).join("config.toml"))
                .unwrap_or_else(|| PathBuf::from(format!("{}-config.toml", pkg_name)))
        });

        debug!("尝试从 {:?} 加载配置文件", config_path);

        if !config_path.exists() {
            debug!("配置文件 {:?} 不存在，将创建默认配置", config_path);
            let default_config = Config::default();
            let toml = toml::to_string_pretty(&default_config)?;

            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, toml)?;
            info!("已创建默认配置文件: {:?}", config_path);
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        let config = Self::parse(&content).unwrap_or_else(|e| {
            error!("解析配置文件 {:?} 失败: {}", config_path, e);
            warn!("由于解析错误，将加载默认配置");
            Config::default()
        });

        debug!("已成功加载配置文件");
        Ok(config)
    }

    /// 解析 TOML 配置，缺省字段使用默认值
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
player_priority = ["mpv"]

[daemon]
window_radius = 1
"#,
        )
        .unwrap();

        assert_eq!(config.player_priority, vec!["mpv".to_string()]);
        assert_eq!(config.daemon.window_radius, 1);
        assert_eq!(config.daemon.tick_interval_ms, 50);
        assert_eq!(config.cache.max_artist_query_len, 30);
        assert_eq!(config.daemon.sync_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_out_of_range_intervals_fall_back_to_default() {
        let config = Config::parse(
            r#"
[daemon]
sync_interval_secs = inf
priority_check_interval_secs = 1e30
"#,
        )
        .unwrap();

        assert_eq!(config.daemon.sync_interval(), Duration::from_secs(5));
        assert_eq!(config.daemon.priority_check_interval(), Duration::from_secs(5));

        let config = Config::parse("[daemon]\nsync_interval_secs = -2.0\n").unwrap();
        assert_eq!(config.daemon.sync_interval(), Duration::ZERO);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.lyrics_sources, vec!["local", "lrclib"]);
        assert!(config.sources.lrclib.is_some());
    }
}
