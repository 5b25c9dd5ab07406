//! Full pipeline runs against real files with the `image`-crate codec.

use image::{ImageEncoder, RgbImage};
use img_resize::config::ResizeConfig;
use img_resize::imaging::{ImageCodec, OutputFormat};
use img_resize::pool::TaskPool;
use img_resize::process::process;
use img_resize::report;
use img_resize::resizer::{ImageTask, ResizeSettings, submit_image_task};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::io::BufWriter::new(std::fs::File::create(path).unwrap());
    image::codecs::jpeg::JpegEncoder::new(file)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn config(input: &Path, output: &Path) -> ResizeConfig {
    ResizeConfig {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        threads: Some(2),
        ..ResizeConfig::default()
    }
}

#[test]
fn jpeg_gets_full_size_copy_and_smaller_widths() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_jpeg(&input.path().join("photo.jpg"), 1000, 750);

    let summary = process(&config(input.path(), output.path())).unwrap();

    assert_eq!(summary.images, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(
        file_names(output.path()),
        vec!["400w:photo.webp", "800w:photo.webp", "photo.webp"]
    );

    let medium = image::open(output.path().join("800w:photo.webp")).unwrap();
    assert_eq!((medium.width(), medium.height()), (800, 600));
    let full = image::open(output.path().join("photo.webp")).unwrap();
    assert_eq!((full.width(), full.height()), (1000, 750));
}

#[test]
fn narrow_image_gets_smallest_width_only() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_jpeg(&input.path().join("thumb.jpg"), 200, 100);

    let summary = process(&config(input.path(), output.path())).unwrap();

    assert_eq!(summary.errors, 0);
    assert_eq!(
        file_names(output.path()),
        vec!["400w:thumb.webp", "thumb.webp"]
    );
    let upscaled = image::open(output.path().join("400w:thumb.webp")).unwrap();
    assert_eq!((upscaled.width(), upscaled.height()), (400, 200));
}

#[test]
fn recursive_run_mirrors_directories() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_jpeg(&input.path().join("top.jpg"), 500, 500);
    write_jpeg(&input.path().join("trips/2024/beach.jpg"), 500, 250);
    std::fs::write(input.path().join("trips/notes.txt"), "not an image").unwrap();

    let mut cfg = config(input.path(), output.path());
    cfg.recursive = true;
    cfg.sizes = vec![400];
    let summary = process(&cfg).unwrap();

    assert_eq!(summary.images, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(
        file_names(output.path()),
        vec!["400w:top.webp", "top.webp"]
    );
    assert_eq!(
        file_names(&output.path().join("trips/2024")),
        vec!["400w:beach.webp", "beach.webp"]
    );
    assert!(file_names(&output.path().join("trips")).is_empty());
}

#[test]
fn non_recursive_run_ignores_subdirectories() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_jpeg(&input.path().join("nested/deep.jpg"), 500, 500);

    let summary = process(&config(input.path(), output.path())).unwrap();

    assert_eq!(summary.images, 0);
    assert!(file_names(output.path()).is_empty());
    assert!(!output.path().join("nested").exists());
}

#[test]
fn container_mode_groups_files_per_image() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_jpeg(&input.path().join("cat.jpg"), 600, 300);

    let mut cfg = config(input.path(), output.path());
    cfg.container = true;
    cfg.sizes = vec![400];
    cfg.template = "{f}-{s}".to_string();
    let summary = process(&cfg).unwrap();

    assert_eq!(summary.errors, 0);
    assert_eq!(
        file_names(&output.path().join("cat")),
        vec!["cat-400.webp", "cat.webp"]
    );
}

#[test]
fn corrupt_file_is_reported_and_others_still_processed() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::write(input.path().join("broken.jpg"), b"definitely not a jpeg").unwrap();
    write_jpeg(&input.path().join("good.jpg"), 500, 500);

    let mut cfg = config(input.path(), output.path());
    cfg.sizes = vec![400];
    let summary = process(&cfg).unwrap();

    assert_eq!(summary.images, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(
        file_names(output.path()),
        vec!["400w:good.webp", "good.webp"]
    );
}

#[test]
fn unsorted_duplicate_sizes_never_upscale_or_repeat() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_jpeg(&input.path().join("photo.jpg"), 600, 300);

    let mut cfg = config(input.path(), output.path());
    cfg.sizes = vec![400, 800, 400];
    let summary = process(&cfg).unwrap();

    assert_eq!(summary.errors, 0);
    // top-level + full size + 400
    assert_eq!(summary.tasks_completed, 3);
    assert_eq!(
        file_names(output.path()),
        vec!["400w:photo.webp", "photo.webp"]
    );
}

#[test]
fn single_image_task_on_the_pool() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src/shot.jpg");
    write_jpeg(&source, 300, 200);
    let out = tmp.path().join("out");

    let settings = Arc::new(ResizeSettings {
        widths: vec![250, 100],
        container: false,
        template: "{s}w:{f}".to_string(),
        extensions: vec!["jpg".to_string()],
        format: OutputFormat::WebP,
    });
    let codec = Arc::new(ImageCodec::new());
    let (reporter, rx) = report::channel();
    let pool = TaskPool::new(2, reporter.clone()).unwrap();

    let task = ImageTask::new(&source, &out, settings).unwrap();
    submit_image_task(&codec, task, &pool, &reporter);
    let completed = pool.drain();

    let errors: Vec<_> = rx.try_iter().collect();
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(completed, 4);
    assert_eq!(
        file_names(&out),
        vec!["100w:shot.webp", "250w:shot.webp", "shot.webp"]
    );
    let small = image::open(out.join("100w:shot.webp")).unwrap();
    assert_eq!((small.width(), small.height()), (100, 66));
}
