use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use mpris_lyrics_daemon::app;
use mpris_lyrics_daemon::config::Config;
use mpris_lyrics_daemon::display::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "跟随 MPRIS 播放器显示同步歌词", long_about = None)]
struct Cli {
    /// 以守护进程模式运行，持续写入快照文件
    #[arg(long)]
    daemon: bool,

    /// 一次性查询的输出格式
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// 只使用指定的播放器
    #[arg(long, value_name = "NAME")]
    target: Option<String>,

    /// 配置文件路径
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// 日志输出到 stderr，stdout 只用于查询结果
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    debug!("命令行参数: {:?}", cli);

    let config = match Config::load(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("加载配置失败，使用默认配置: {:#}", e);
            Config::default()
        }
    };

    if cli.daemon {
        if let Err(e) = app::run_daemon(&config, cli.target.as_deref()).await {
            error!("守护进程启动失败: {:#}", e);
            return ExitCode::FAILURE;
        }
    } else {
        app::run_once(&config, cli.target.as_deref(), cli.format).await;
    }

    ExitCode::SUCCESS
}
