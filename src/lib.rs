// 歌词守护进程核心库

// 模块导出
pub mod app;
pub mod config;
pub mod display;
pub mod lyrics;
pub mod mpris;
pub mod player;
pub mod utils;
