use clap::Parser;
use img_resize::{config, output, process};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "img-resize")]
#[command(about = "Batch-resize images into a cascade of WebP widths")]
#[command(long_about = "\
Batch-resize images into a cascade of WebP widths

Every JPEG, PNG and WebP file in the input directory is written out once per
target width smaller than the image itself, plus a full-size WebP copy for
non-WebP sources. An image narrower than every width still gets the smallest.

  photo.jpg (1000 px wide), sizes 1400,1200,800,400:

  out/
  ├── photo.webp
  ├── 800w:photo.webp
  └── 400w:photo.webp

Settings are read from img-resize.toml in the working directory (or --config)
and overridden by flags. Run 'img-resize --gen-config' for a documented file.")]
#[command(version)]
struct Cli {
    /// Comma-separated target widths, e.g. 1400,1200,800,400
    #[arg(long)]
    size: Option<String>,

    /// Output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Input directory
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Resize a single file instead of scanning a directory
    #[arg(long)]
    file: Option<PathBuf>,

    /// Descend into subdirectories, mirroring them under the output directory
    #[arg(short, long)]
    recursive: bool,

    /// Put each image's files into a folder named after the image
    #[arg(short, long)]
    container: bool,

    /// Output name template: {s} = width, {f} = source name without extension
    #[arg(long)]
    format: Option<String>,

    /// Worker threads (capped at the number of CPU cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Config file (default: img-resize.toml in the working directory, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a stock img-resize.toml with all options documented, then exit
    #[arg(long)]
    gen_config: bool,

    /// More log output (-v for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            sizes: self.size.clone(),
            input_dir: self.input_dir.clone(),
            output_dir: self.out_dir.clone(),
            file: self.file.clone(),
            recursive: self.recursive,
            container: self.container,
            template: self.format.clone(),
            threads: self.threads,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = config::load_config(cli.config.as_deref(), Path::new("."))?;
    config.apply(cli.overrides());

    let summary = process::process(&config)?;
    for line in output::format_summary(&summary) {
        println!("{line}");
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins; otherwise `info`, or `debug` with `-v`.
fn init_tracing(verbose: u8) {
    let default_level = if verbose > 0 { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
