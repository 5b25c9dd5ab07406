//! Per-task error reporting.
//!
//! Every failure inside a work item becomes one [`TaskError`] pushed onto an
//! unbounded channel through a [`Reporter`]. A single sink thread, started
//! with [`spawn_sink`], logs each error as it arrives and counts them. The
//! channel closes once the last `Reporter` clone is dropped, which only
//! happens after the pool has drained, so the sink sees every error.

use crate::imaging::CodecError;
use crate::output;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("cannot read directory {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("unsupported extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error("{}: {source}", .path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("cannot create output directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Sending half of the error channel. Cheap to clone into every task.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: Sender<TaskError>,
}

impl Reporter {
    /// Push one error to the sink. Never blocks.
    pub fn report(&self, err: TaskError) {
        if let Err(mpsc::SendError(err)) = self.tx.send(err) {
            warn!("error sink already closed, dropping: {}", err);
        }
    }
}

/// Create the error channel.
pub fn channel() -> (Reporter, Receiver<TaskError>) {
    let (tx, rx) = mpsc::channel();
    (Reporter { tx }, rx)
}

/// Drain `rx` on a dedicated thread, logging every error.
///
/// The thread returns the number of errors seen once the channel closes.
pub fn spawn_sink(rx: Receiver<TaskError>) -> std::io::Result<JoinHandle<usize>> {
    std::thread::Builder::new()
        .name("img-resize-errors".to_string())
        .spawn(move || {
            let mut count = 0;
            for err in rx {
                error!("{}", output::format_task_error(&err));
                count += 1;
            }
            count
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_counts_errors_until_all_reporters_drop() {
        let (reporter, rx) = channel();
        let sink = spawn_sink(rx).unwrap();

        let clone = reporter.clone();
        std::thread::spawn(move || {
            clone.report(TaskError::Panicked("boom".into()));
        })
        .join()
        .unwrap();
        reporter.report(TaskError::UnsupportedExtension("a.gif".into()));
        drop(reporter);

        assert_eq!(sink.join().unwrap(), 2);
    }

    #[test]
    fn report_after_sink_closed_does_not_panic() {
        let (reporter, rx) = channel();
        drop(rx);
        reporter.report(TaskError::Panicked("late".into()));
    }

    #[test]
    fn codec_error_display_includes_path() {
        let err = TaskError::Codec {
            path: "in/photo.jpg".into(),
            source: CodecError::Decode("bad header".into()),
        };
        assert_eq!(
            err.to_string(),
            "in/photo.jpg: failed to decode image: bad header"
        );
    }
}
