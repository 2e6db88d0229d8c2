use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 原子写入：先写同目录下的临时文件，再 rename 覆盖目标
///
/// 读者只会看到旧文件或完整的新文件。
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// `<文件名>.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_keeps_extension() {
        assert_eq!(
            temp_path(Path::new("/tmp/lyrics-daemon.json")),
            PathBuf::from("/tmp/lyrics-daemon.json.tmp")
        );
        assert_eq!(
            temp_path(Path::new("cache/abc.meta")),
            PathBuf::from("cache/abc.meta.tmp")
        );
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = std::env::temp_dir().join(format!("mpris-lyrics-fs-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let target = dir.join("out.json");

        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        assert!(!dir.join("out.json.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
