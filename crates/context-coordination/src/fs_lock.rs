//! Directory-as-mutex fallback lock (spec §9 Open Questions: "the file
//! system based lock helper... is retained as an option but the
//! coordination-DB locks are authoritative"). Only for callers without a
//! handle to [`crate::CoordinationStore`]; no code path in this crate
//! consults both the DB locks table and this helper for the same resource.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const RETRY_ATTEMPTS: u32 = 20;
const RETRY_DELAY: Duration = Duration::from_millis(200);
const STALE_AFTER: Duration = Duration::from_secs(10);

/// A lock represented by the presence of a directory. Creating a directory
/// is atomic on every platform this crate targets, so it doubles as a
/// cross-process mutex without any DB involvement.
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Block (retrying up to 20 times, 200ms apart) until `path` can be
    /// claimed as a directory, treating an existing lock directory older
    /// than 10s as abandoned and removable.
    pub fn acquire_blocking(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        for attempt in 0..RETRY_ATTEMPTS {
            match std::fs::create_dir(&path) {
                Ok(()) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        let _ = std::fs::remove_dir_all(&path);
                        continue;
                    }
                    if attempt + 1 < RETRY_ATTEMPTS {
                        std::thread::sleep(RETRY_DELAY);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            format!("could not acquire lock directory {} after {RETRY_ATTEMPTS} attempts", path.display()),
        ))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn is_stale(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    let Ok(age) = SystemTime::now().duration_since(modified) else {
        return false;
    };
    age > STALE_AFTER
}

#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_fast_when_not_stale() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("resource.lock");
        let _held = DirLock::acquire_blocking(&lock_path).unwrap();
        assert!(lock_path.is_dir());
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("resource.lock");
        {
            let _held = DirLock::acquire_blocking(&lock_path).unwrap();
        }
        assert!(!lock_path.exists());
    }

    #[test]
    fn reacquire_after_drop_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("resource.lock");
        drop(DirLock::acquire_blocking(&lock_path).unwrap());
        let second = DirLock::acquire_blocking(&lock_path);
        assert!(second.is_ok());
    }
}
