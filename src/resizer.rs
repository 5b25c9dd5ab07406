//! Per-image resize cascade.
//!
//! A [`Resizer`] owns one decoded source image. It decides which widths to
//! render ([`plan_cascade`]) and fans the work out onto the [`TaskPool`]:
//!
//! ```text
//! ImageTask ──► Resizer::init ──► containerize / ensure_output_dir
//!                                        │
//!                         create_resize_tasks
//!                  ┌──────────────┬──────┴───────┬──────────────┐
//!             full size       width 800      width 400        ...
//!           (non-WebP only)
//! ```
//!
//! Each derivative job captures its own immutable snapshot (shared image
//! handle, width, output path), so sibling jobs never observe each other and
//! may finish in any order. The decoded image is freed when the last of them
//! drops its handle.

use crate::config::ResizeConfig;
use crate::imaging::{Codec, CodecError, Dimensions, OutputFormat, plan_cascade, scaled_height};
use crate::naming::{self, SourceName};
use crate::pool::TaskPool;
use crate::report::{Reporter, TaskError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Settings shared by every image of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSettings {
    /// Target widths, descending and unique.
    pub widths: Vec<u32>,
    pub container: bool,
    pub template: String,
    /// Accepted source extensions (case-sensitive).
    pub extensions: Vec<String>,
    pub format: OutputFormat,
}

impl ResizeSettings {
    pub fn from_config(config: &ResizeConfig) -> Self {
        Self {
            widths: config.sizes.clone(),
            container: config.container,
            template: config.template.clone(),
            extensions: config.extensions.clone(),
            format: OutputFormat::default(),
        }
    }

    /// Whether `extension` is on the allow-list.
    pub fn accepts(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// One source image waiting to be resized.
#[derive(Debug, Clone)]
pub struct ImageTask {
    pub source: PathBuf,
    pub name: SourceName,
    /// Directory the derivatives go to (before containerization).
    pub output_dir: PathBuf,
    pub settings: Arc<ResizeSettings>,
}

impl ImageTask {
    /// Build a task, rejecting files whose extension is not accepted.
    pub fn new(
        source: &Path,
        output_dir: &Path,
        settings: Arc<ResizeSettings>,
    ) -> Result<Self, TaskError> {
        let name = naming::split_file_name(source)
            .filter(|name| settings.accepts(&name.extension))
            .ok_or_else(|| TaskError::UnsupportedExtension(source.to_path_buf()))?;
        Ok(Self {
            source: source.to_path_buf(),
            name,
            output_dir: output_dir.to_path_buf(),
            settings,
        })
    }

    /// Whether a full-size copy in the canonical format is needed.
    ///
    /// The extension compare ignores ASCII case, so `x.WEBP` is never
    /// re-encoded onto a case-insensitive twin of itself.
    pub fn needs_full_size(&self) -> bool {
        !self
            .name
            .extension
            .eq_ignore_ascii_case(self.settings.format.extension())
    }
}

/// A loaded source image ready to fan out into derivative jobs.
pub struct Resizer<C: Codec> {
    codec: Arc<C>,
    task: ImageTask,
    image: Arc<C::Handle>,
    dimensions: Dimensions,
    output_dir: PathBuf,
}

impl<C: Codec> Resizer<C> {
    /// Load, decode and measure the source image.
    pub fn init(codec: Arc<C>, task: ImageTask) -> Result<Self, TaskError> {
        if !task.settings.accepts(&task.name.extension) {
            return Err(TaskError::UnsupportedExtension(task.source));
        }

        let codec_err = |source: CodecError| TaskError::Codec {
            path: task.source.clone(),
            source,
        };
        let bytes = codec.read(&task.source).map_err(codec_err)?;
        let image = codec.decode(&bytes).map_err(codec_err)?;
        let dimensions = codec.size(&image).map_err(codec_err)?;
        let output_dir = task.output_dir.clone();

        Ok(Self {
            codec,
            task,
            image: Arc::new(image),
            dimensions,
            output_dir,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Directory derivatives are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Widths this image will be rendered at.
    pub fn cascade(&self) -> &[u32] {
        plan_cascade(self.dimensions.width, &self.task.settings.widths)
    }

    /// Redirect output into a subdirectory named after the image, creating it.
    pub fn containerize(&mut self) -> Result<(), TaskError> {
        self.output_dir = self.output_dir.join(&self.task.name.base);
        self.ensure_output_dir()
    }

    /// Create the output directory (and parents) if missing.
    pub fn ensure_output_dir(&self) -> Result<(), TaskError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| TaskError::DirectoryCreate {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Submit one job per cascade width, plus a full-size job when the source
    /// is not already in the canonical format. Returns the number submitted.
    pub fn create_resize_tasks(self, pool: &TaskPool, reporter: &Reporter) -> usize {
        let settings = Arc::clone(&self.task.settings);
        let format = settings.format;
        let mut submitted = 0;

        if self.task.needs_full_size() {
            let job = FullSizeJob {
                codec: Arc::clone(&self.codec),
                image: Arc::clone(&self.image),
                source: self.task.source.clone(),
                output: self
                    .output_dir
                    .join(naming::full_size_name(&self.task.name.base, format)),
                format,
            };
            let reporter = reporter.clone();
            pool.submit(move || {
                if let Err(e) = job.run() {
                    reporter.report(e);
                }
            });
            submitted += 1;
        }

        let cascade = self.cascade();
        info!("Resizing {} to {:?}", self.task.name.base, cascade);
        for &width in cascade {
            let job = WidthJob {
                codec: Arc::clone(&self.codec),
                image: Arc::clone(&self.image),
                intrinsic: self.dimensions,
                width,
                source: self.task.source.clone(),
                output: self.output_dir.join(naming::format_name(
                    &settings.template,
                    &self.task.name.base,
                    width,
                    format,
                )),
                format,
            };
            let reporter = reporter.clone();
            pool.submit(move || {
                if let Err(e) = job.run() {
                    reporter.report(e);
                }
            });
            submitted += 1;
        }

        submitted
    }
}

/// Snapshot for writing the un-resized image in the canonical format.
struct FullSizeJob<C: Codec> {
    codec: Arc<C>,
    image: Arc<C::Handle>,
    source: PathBuf,
    output: PathBuf,
    format: OutputFormat,
}

impl<C: Codec> FullSizeJob<C> {
    fn run(self) -> Result<(), TaskError> {
        debug!("Converting {} to {}", self.source.display(), self.format);
        self.codec
            .convert(&self.image, self.format)
            .and_then(|bytes| self.codec.write(&self.output, &bytes))
            .map_err(|source| TaskError::Codec {
                path: self.source,
                source,
            })
    }
}

/// Snapshot for rendering one cascade width.
struct WidthJob<C: Codec> {
    codec: Arc<C>,
    image: Arc<C::Handle>,
    intrinsic: Dimensions,
    width: u32,
    source: PathBuf,
    output: PathBuf,
    format: OutputFormat,
}

impl<C: Codec> WidthJob<C> {
    fn run(self) -> Result<(), TaskError> {
        let height = scaled_height(self.width, self.intrinsic);
        debug!(
            "Resizing {} to {}x{}",
            self.source.display(),
            self.width,
            height
        );
        self.codec
            .resize(&self.image, self.width, height, self.format)
            .and_then(|bytes| self.codec.write(&self.output, &bytes))
            .map_err(|source| TaskError::Codec {
                path: self.source,
                source,
            })
    }
}

/// Top-level work item for one discovered image.
///
/// Any failure before fan-out (unsupported, unreadable, undecodable, output
/// directory not creatable) is reported and abandons only this image.
pub fn run_image_task<C: Codec>(
    codec: Arc<C>,
    task: ImageTask,
    pool: &TaskPool,
    reporter: &Reporter,
) {
    let container = task.settings.container;
    let result = Resizer::init(codec, task).and_then(|mut resizer| {
        if container {
            resizer.containerize()?;
        } else {
            resizer.ensure_output_dir()?;
        }
        Ok(resizer.create_resize_tasks(pool, reporter))
    });

    if let Err(e) = result {
        reporter.report(e);
    }
}

/// Submit the top-level work item for `task`.
pub fn submit_image_task<C: Codec>(
    codec: &Arc<C>,
    task: ImageTask,
    pool: &TaskPool,
    reporter: &Reporter,
) {
    let codec = Arc::clone(codec);
    let inner_pool = pool.clone();
    let reporter = reporter.clone();
    pool.submit(move || run_image_task(codec, task, &inner_pool, &reporter));
}
