// 应用层：守护进程与一次性查询

mod daemon;
mod oneshot;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::config::Config;
use crate::display::{format_json, format_waybar, DaemonSnapshot, OutputFormat};
use crate::lyrics::ProviderChain;
use crate::mpris::MprisBus;

pub use daemon::DaemonLoop;
pub use oneshot::query_once;
pub use output::{PidFile, SnapshotWriter};

/// `--target` 指定时只考虑该播放器
pub fn effective_priority(config: &Config, target: Option<&str>) -> Vec<String> {
    match target {
        Some(name) => vec![name.to_string()],
        None => config.player_priority.clone(),
    }
}

/// SIGINT / SIGTERM 时清除运行标志
fn install_signal_handler(running: Arc<AtomicBool>) -> Result<()> {
    let mut terminate = signal(SignalKind::terminate()).context("无法注册 SIGTERM 处理")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("收到 SIGINT"),
            _ = terminate.recv() => info!("收到 SIGTERM"),
        }
        running.store(false, Ordering::SeqCst);
    });

    Ok(())
}

/// 以守护进程模式运行，会话总线不可用时返回错误
pub async fn run_daemon(config: &Config, target: Option<&str>) -> Result<()> {
    let bus = MprisBus::connect()
        .await
        .context("无法连接 D-Bus 会话总线")?;

    // PID 文件写入失败不影响运行
    let _pid = PidFile::acquire(config.daemon.pid_path.clone());

    let running = Arc::new(AtomicBool::new(true));
    install_signal_handler(running.clone())?;

    let source = Arc::new(ProviderChain::from_config(config));
    if source.is_empty() {
        warn!("没有可用的歌词源");
    }

    let mut daemon = DaemonLoop::from_config(
        config,
        effective_priority(config, target),
        Arc::new(bus),
        source,
    );
    daemon.run(running).await;

    Ok(())
}

/// 一次性查询并打印到标准输出
pub async fn run_once(config: &Config, target: Option<&str>, format: OutputFormat) {
    let output = match MprisBus::connect().await {
        Ok(bus) => {
            query_once(
                config,
                effective_priority(config, target),
                format,
                Arc::new(bus),
                Arc::new(ProviderChain::from_config(config)),
            )
            .await
        }
        Err(e) => {
            warn!("无法连接 D-Bus 会话总线: {}", e);
            match format {
                OutputFormat::Json => format_json(&DaemonSnapshot::stopped()).unwrap_or_default(),
                OutputFormat::Waybar => format_waybar(&DaemonSnapshot::stopped()),
                _ => "No active player found.".to_string(),
            }
        }
    };

    println!("{}", output);
}
