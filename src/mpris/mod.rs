// MPRIS 交互模块
// 导出媒体控制能力接口及其 D-Bus 实现

mod bus;
mod error;
mod types;

pub use bus::{MediaControl, MprisBus};
pub use error::MprisError;
pub use types::{PlaybackStatus, PlayerState, TrackIdentity};
