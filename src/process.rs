//! Run orchestration.
//!
//! Wires the pieces of one run together:
//!
//! ```text
//! config ──► walk / single file ──► TaskPool ◄──► Resizer jobs
//!                                      │
//!                                 Reporter ──► error sink thread
//! ```
//!
//! Discovery submits one top-level task per image while it is still walking.
//! Those tasks submit their own derivative jobs. [`process`] returns once the
//! pool has drained and the sink has logged every error.

use crate::config::{ConfigError, ResizeConfig, effective_threads};
use crate::imaging::{Codec, ImageCodec};
use crate::pool::{PoolError, TaskPool};
use crate::report;
use crate::resizer::{ImageTask, ResizeSettings, submit_image_task};
use crate::walk;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("failed to start error sink: {0}")]
    Io(#[from] std::io::Error),
    #[error("error sink panicked")]
    SinkPanicked,
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Top-level image tasks submitted.
    pub images: usize,
    /// Work items that ran to completion, including failed ones.
    pub tasks_completed: usize,
    /// Errors reported through the sink.
    pub errors: usize,
    pub elapsed: Duration,
}

/// Resize everything `config` selects with the `image`-crate codec.
pub fn process(config: &ResizeConfig) -> Result<RunSummary, ProcessError> {
    process_with_codec(Arc::new(ImageCodec::new()), config)
}

/// Like [`process`], with any [`Codec`].
///
/// `config` is normalized and validated first, so an unsorted or duplicated
/// size list behaves exactly like its sorted, de-duplicated form.
pub fn process_with_codec<C: Codec>(
    codec: Arc<C>,
    config: &ResizeConfig,
) -> Result<RunSummary, ProcessError> {
    let start = Instant::now();
    let mut normalized = config.clone();
    normalized.normalize();
    normalized.validate()?;
    let config = &normalized;

    let (reporter, rx) = report::channel();
    let sink = report::spawn_sink(rx)?;

    let threads = effective_threads(config);
    let pool = TaskPool::new(threads, reporter.clone())?;

    let settings = Arc::new(ResizeSettings::from_config(config));

    let images = match &config.file {
        Some(file) => match ImageTask::new(file, &config.output_dir, Arc::clone(&settings)) {
            Ok(task) => {
                submit_image_task(&codec, task, &pool, &reporter);
                1
            }
            Err(e) => {
                reporter.report(e);
                0
            }
        },
        None => {
            info!(
                "Scanning {}{}",
                config.input_dir.display(),
                if config.recursive { " recursively" } else { "" }
            );
            walk::submit_tree(
                &codec,
                &settings,
                &config.input_dir,
                &config.output_dir,
                config.recursive,
                &pool,
                &reporter,
            )
        }
    };

    let tasks_completed = pool.drain();

    // The sink only finishes once every sender, including the pool's, is gone.
    drop(pool);
    drop(reporter);
    let errors = sink.join().map_err(|_| ProcessError::SinkPanicked)?;

    Ok(RunSummary {
        images,
        tasks_completed,
        errors,
        elapsed: start.elapsed(),
    })
}
