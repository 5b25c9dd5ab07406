//! CLI output formatting.
//!
//! Every function here is pure and returns strings; the caller decides
//! where they go. Per-task errors are logged by the error sink as they
//! arrive; the summary is printed once the pool has drained.
//!
//! ```text
//! ERROR in/broken.jpg: failed to decode image: ...
//! ERROR cannot create output directory out/cat: File exists (os error 17)
//! img-resize took 1.42s
//! 12 images, 48 tasks, 2 errors
//! Done!
//! ```

use crate::process::RunSummary;
use crate::report::TaskError;
use std::error::Error;

/// One-line rendering of a task error with its full cause chain.
///
/// Causes whose text is already contained in the line are skipped, since
/// most wrapped errors repeat their source in their own message.
pub fn format_task_error(err: &TaskError) -> String {
    let mut line = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !line.contains(&text) {
            line.push_str(": ");
            line.push_str(&text);
        }
        cause = inner.source();
    }
    line
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Final lines printed after the run.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    vec![
        format!("img-resize took {:.2?}", summary.elapsed),
        format!(
            "{}, {}, {}",
            plural(summary.images, "image"),
            plural(summary.tasks_completed, "task"),
            plural(summary.errors, "error")
        ),
        "Done!".to_string(),
    ]
}
