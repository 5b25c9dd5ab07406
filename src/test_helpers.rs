//! Shared test utilities for the img-resize unit tests.
//!
//! Real-pixel fixtures live with the integration tests in `tests/`.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! touch_files(tmp.path(), &["a.jpg", "trips/b.png"]);
//! ```

use std::path::Path;

/// Create empty files (and their parent directories) under `root`.
///
/// Good enough for tests that never decode, e.g. with `MockCodec`.
pub fn touch_files(root: &Path, relative: &[&str]) {
    for rel in relative {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"").unwrap();
    }
}
