//! Source discovery.
//!
//! Walks the input root and yields every accepted image together with the
//! output directory it maps to. In recursive mode the relative directory
//! structure is mirrored under the output root:
//!
//! ```text
//! input/                    output/
//! ├── a.jpg          →      ├── 800w:a.webp ...
//! ├── notes.txt             │
//! └── trips/                └── trips/
//!     └── b.png      →          └── 800w:b.webp ...
//! ```
//!
//! Without recursion only the top level is read and subdirectories are
//! skipped. Files with an extension outside the allow-list are skipped
//! silently. An unreadable directory is reported as
//! [`TaskError::Discovery`] and only its own subtree is lost.

use crate::imaging::Codec;
use crate::pool::TaskPool;
use crate::report::{Reporter, TaskError};
use crate::resizer::{ImageTask, ResizeSettings, submit_image_task};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// An accepted source file and where its derivatives belong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub source: PathBuf,
    pub output_dir: PathBuf,
}

/// Lazily enumerate accepted images under `input_root`.
///
/// Entries come back sorted by file name within each directory so runs are
/// reproducible. Traversal errors go to `reporter`.
pub fn discover<'a>(
    input_root: &'a Path,
    output_root: &'a Path,
    recursive: bool,
    settings: &'a ResizeSettings,
    reporter: &'a Reporter,
) -> impl Iterator<Item = Discovered> + 'a {
    let max_depth = if recursive { usize::MAX } else { 1 };

    WalkDir::new(input_root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(source) => {
                let path = source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| input_root.to_path_buf());
                reporter.report(TaskError::Discovery { path, source });
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .filter(move |entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| settings.accepts(e))
        })
        .map(move |entry| {
            let relative = entry
                .path()
                .parent()
                .and_then(|parent| parent.strip_prefix(input_root).ok())
                .unwrap_or_else(|| Path::new(""));
            Discovered {
                source: entry.path().to_path_buf(),
                output_dir: output_root.join(relative),
            }
        })
}

/// Walk `input_root` and submit one top-level task per accepted image.
///
/// Returns the number of images submitted. Work starts while the walk is
/// still running.
pub fn submit_tree<C: Codec>(
    codec: &Arc<C>,
    settings: &Arc<ResizeSettings>,
    input_root: &Path,
    output_root: &Path,
    recursive: bool,
    pool: &TaskPool,
    reporter: &Reporter,
) -> usize {
    let mut submitted = 0;
    for found in discover(input_root, output_root, recursive, settings, reporter) {
        match ImageTask::new(&found.source, &found.output_dir, Arc::clone(settings)) {
            Ok(task) => {
                debug!(
                    "Queued {} → {}",
                    found.source.display(),
                    found.output_dir.display()
                );
                submit_image_task(codec, task, pool, reporter);
                submitted += 1;
            }
            Err(e) => reporter.report(e),
        }
    }
    submitted
}
