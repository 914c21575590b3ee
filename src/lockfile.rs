use std::fs::{self, File};
use std::io;
use std::path::Path;

use fs2::FileExt;

/// Advisory file lock guarding a read-modify-write section against other
/// dashboard processes on the same workspace. Released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Block until the lock at `path` is held. Parent directories are created
    /// as needed; the lock file itself is left behind after release.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
