//! Unique scratch paths for intermediate build output.

use crate::bundler::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Attempts made to find an unused scratch path before giving up.
pub const TEMP_PATH_ATTEMPTS: usize = 8;

/// Source of unique identifiers for scratch file names.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Monotonic counter, for reproducible paths in tests.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

/// Returns `<dir>/<prefix>-<id>.<extension>` for the first id whose path
/// does not exist yet.
///
/// Existence is checked but not reserved; two processes drawing the same id
/// at the same moment can still collide.
pub fn allocate_temp_path(
    dir: &Path,
    prefix: &str,
    extension: &str,
    ids: &dyn IdGenerator,
) -> Result<PathBuf> {
    for _ in 0..TEMP_PATH_ATTEMPTS {
        let candidate = dir.join(format!("{}-{}.{}", prefix, ids.next_id(), extension));
        if !candidate.exists() {
            return Ok(candidate);
        }
        log::debug!("Scratch path {} already exists, retrying", candidate.display());
    }
    Err(Error::GenericError(format!(
        "could not find an unused scratch path for '{}' in {} after {} attempts",
        prefix,
        dir.display(),
        TEMP_PATH_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedId;

    impl IdGenerator for FixedId {
        fn next_id(&self) -> String {
            "same".to_string()
        }
    }

    #[test]
    fn sequential_ids_give_exact_paths() {
        let ids = SequentialIds::starting_at(42);
        let dir = Path::new("/nonexistent-scratch");
        assert_eq!(
            allocate_temp_path(dir, "bundledWorker", "mjs", &ids).unwrap(),
            dir.join("bundledWorker-42.mjs")
        );
        assert_eq!(
            allocate_temp_path(dir, "bundledWorker", "mjs", &ids).unwrap(),
            dir.join("bundledWorker-43.mjs")
        );
    }

    #[test]
    fn skips_existing_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bundledWorker-0.mjs"), "taken").unwrap();
        let ids = SequentialIds::default();
        assert_eq!(
            allocate_temp_path(dir.path(), "bundledWorker", "mjs", &ids).unwrap(),
            dir.path().join("bundledWorker-1.mjs")
        );
    }

    #[test]
    fn gives_up_on_persistent_collision() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bundledWorker-same.mjs"), "taken").unwrap();
        assert!(allocate_temp_path(dir.path(), "bundledWorker", "mjs", &FixedId).is_err());
    }
}
