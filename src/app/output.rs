use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::display::DaemonSnapshot;
use crate::utils::write_atomic;

/// 快照文件发布
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    /// 创建输出目录，失败时只记录日志，由 `publish` 报告后续错误
    pub fn new(path: PathBuf) -> Self {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("无法创建输出目录 {:?}: {}", parent, e);
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 原子写入快照，读取方不会看到写了一半的文件
    pub fn publish(&self, snapshot: &DaemonSnapshot) -> anyhow::Result<()> {
        let body = serde_json::to_vec(snapshot)?;
        write_atomic(&self.path, &body)?;
        Ok(())
    }
}

/// PID 文件，析构时删除
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("{}\n", std::process::id()))?;
        info!("已写入 PID 文件: {:?}", path);
        Ok(Self { path })
    }

    /// 同 [`create`](Self::create)，失败时记录日志并继续运行
    pub fn acquire(path: PathBuf) -> Option<Self> {
        match Self::create(path.clone()) {
            Ok(pid) => Some(pid),
            Err(e) => {
                error!("无法写入 PID 文件 {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("已删除 PID 文件: {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("删除 PID 文件 {:?} 失败: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_file_removed_on_drop() {
        let path = std::env::temp_dir().join(format!("mpris-lyrics-pid-{}.pid", std::process::id()));
        {
            let pid = PidFile::create(path.clone()).unwrap();
            let content = fs::read_to_string(pid.path()).unwrap();
            assert_eq!(content.trim(), std::process::id().to_string());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_pid_path_is_not_fatal() {
        // 父路径是普通文件，无法创建目录
        let blocker = std::env::temp_dir().join(format!("mpris-lyrics-blocker-{}", std::process::id()));
        fs::write(&blocker, "").unwrap();

        assert!(PidFile::acquire(blocker.join("daemon.pid")).is_none());
        let _ = fs::remove_file(&blocker);
    }

    #[test]
    fn test_publish_creates_missing_directory() {
        let dir = std::env::temp_dir().join(format!("mpris-lyrics-outdir-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("lyrics.json");

        let writer = SnapshotWriter::new(path.clone());
        writer.publish(&DaemonSnapshot::stopped()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "stopped");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_publish_replaces_file() {
        let path = std::env::temp_dir().join(format!("mpris-lyrics-out-{}.json", std::process::id()));
        let writer = SnapshotWriter::new(path.clone());

        writer.publish(&DaemonSnapshot::stopped()).unwrap();
        writer.publish(&DaemonSnapshot::no_lyrics()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "no_lyrics");
        let _ = fs::remove_file(&path);
    }
}
