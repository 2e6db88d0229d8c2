/// MPRIS 交互错误
#[derive(Debug, thiserror::Error)]
pub enum MprisError {
    #[error("D-Bus 错误: {0}")]
    DBus(#[from] zbus::Error),

    #[error("D-Bus fdo 错误: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    #[error("播放器 {0} 已断开")]
    Disconnected(String),
}
