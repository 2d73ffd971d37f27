use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::filename::sanitize_filename;

/// 완성된 파일을 사용자에게 넘기는 포트 (브라우저의 "다른 이름으로 저장"에 해당).
pub trait FileSaver: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// 지정한 다운로드 디렉토리에 파일을 쓴다.
/// 같은 이름이 있으면 `이름 (1).flac`처럼 번호를 붙인다.
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 이미 있는 파일은 건드리지 않고 `이름 (n).ext` 후보를 차례로 시도한다.
    /// 존재 확인과 생성을 한 번에 하므로 동시 저장끼리도 덮어쓰지 않는다.
    fn create_free(&self, filename: &str) -> io::Result<(PathBuf, File)> {
        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        let ext = path.extension().and_then(|s| s.to_str());

        for i in 0u32.. {
            let candidate = match (i, ext) {
                (0, _) => self.dir.join(filename),
                (i, Some(ext)) => self.dir.join(format!("{stem} ({i}).{ext}")),
                (i, None) => self.dir.join(format!("{stem} ({i})")),
            };
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("사용할 수 있는 파일 이름이 없습니다: {}", filename),
        ))
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let (path, mut file) = self.create_free(&sanitize_filename(filename))?;
        file.write_all(bytes)?;
        tracing::info!("저장 완료: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("musicdl-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_save_creates_directory_and_file() {
        let dir = scratch_dir("create");
        let saver = DirectorySaver::new(&dir);

        let path = saver.save("告白气球 - 周杰伦.flac", b"abc").unwrap();
        assert_eq!(path, dir.join("告白气球 - 周杰伦.flac"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_does_not_overwrite() {
        let dir = scratch_dir("collide");
        let saver = DirectorySaver::new(&dir);

        let first = saver.save("a - b.flac", b"1").unwrap();
        let second = saver.save("a - b.flac", b"2").unwrap();
        assert_eq!(second, dir.join("a - b (1).flac"));
        assert_eq!(std::fs::read(&first).unwrap(), b"1");
        assert_eq!(std::fs::read(&second).unwrap(), b"2");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_concurrent_saves_get_distinct_files() {
        let dir = scratch_dir("concurrent");
        let saver = std::sync::Arc::new(DirectorySaver::new(&dir));

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let saver = std::sync::Arc::clone(&saver);
                std::thread::spawn(move || saver.save("a - b.flac", &[i]).unwrap())
            })
            .collect();
        let mut paths: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);

        let mut contents: Vec<u8> = paths
            .iter()
            .flat_map(|p| std::fs::read(p).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, (0..8u8).collect::<Vec<_>>());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
