//! HyperSpec CLI - mask inspection, conversion, splitting and patch export

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array3;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use hyperspec_core::io::{read_label_map, write_label_map};
use hyperspec_core::Mask;
use hyperspec_data::patch::create_patches;
use hyperspec_data::sample::{SamplingMode, sample_gt};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hyperspec")]
#[command(author, version, about = "Hyperspectral classification toolkit", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a mask file
    Info {
        /// Input mask file
        input: PathBuf,
        /// Dataset key for keyed containers (.h5, .mat)
        #[arg(long)]
        key: Option<String>,
    },
    /// Convert a mask between file formats
    Convert {
        /// Input mask file
        input: PathBuf,
        /// Output mask file
        output: PathBuf,
        /// Dataset key for a keyed input container
        #[arg(long)]
        in_key: Option<String>,
        /// Dataset key for a keyed output container
        #[arg(long)]
        out_key: Option<String>,
    },
    /// Split a mask into disjoint train and test label maps
    Split {
        /// Input mask file
        input: PathBuf,
        /// Dataset key for keyed containers (.h5, .mat)
        #[arg(long)]
        key: Option<String>,
        /// Train label map output (.npy or image)
        #[arg(long)]
        train_out: PathBuf,
        /// Test label map output (.npy or image)
        #[arg(long)]
        test_out: PathBuf,
        /// Sampling mode: random, fixed or disjoint
        #[arg(long, default_value = "random")]
        mode: String,
        /// Train fraction in (0, 1), or an absolute sample count
        #[arg(long, default_value_t = 0.8)]
        train_size: f64,
    },
    /// Extract training patches from an image cube and a mask
    Patches {
        /// Image cube (.npy, rows x cols x bands)
        image: PathBuf,
        /// Mask file
        mask: PathBuf,
        /// Dataset key for keyed containers (.h5, .mat)
        #[arg(long)]
        key: Option<String>,
        /// Output directory for patches.npy and labels.npy
        #[arg(long)]
        out_dir: PathBuf,
        /// Spatial patch size (odd)
        #[arg(long, default_value_t = 5)]
        patch_size: usize,
        /// Keep background (label 0) patches
        #[arg(long)]
        keep_background: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Info { input, key } => cmd_info(&input, key.as_deref()),
        Commands::Convert {
            input,
            output,
            in_key,
            out_key,
        } => cmd_convert(&input, &output, in_key.as_deref(), out_key.as_deref()),
        Commands::Split {
            input,
            key,
            train_out,
            test_out,
            mode,
            train_size,
        } => cmd_split(&input, key.as_deref(), &train_out, &test_out, &mode, train_size),
        Commands::Patches {
            image,
            mask,
            key,
            out_dir,
            patch_size,
            keep_background,
        } => cmd_patches(&image, &mask, key.as_deref(), &out_dir, patch_size, keep_background),
    }
}

// ─── Commands ───────────────────────────────────────────────────────────

fn cmd_info(input: &PathBuf, key: Option<&str>) -> Result<()> {
    let mask = Mask::load(input, key)
        .with_context(|| format!("cannot load mask from {}", input.display()))?;

    let (rows, cols, layers) = mask.shape();
    println!("Mask: {}", input.display());
    println!("  Size:    {rows} x {cols}");
    println!("  Classes: {layers}");

    let map = mask.get_2d();
    println!("  Pixels per class:");
    for k in 0..layers {
        let count = map.iter().filter(|&&v| v as usize == k).count();
        let label = mask
            .label_class()
            .get(&k)
            .map(String::as_str)
            .unwrap_or(if k == 0 { "(background)" } else { "" });
        println!("    {k:>3}: {count:>10}  {label}");
    }

    match mask.validate() {
        Ok(()) => println!("  Canonical: yes"),
        Err(e) => println!("  Canonical: no ({e})"),
    }
    Ok(())
}

fn cmd_convert(
    input: &PathBuf,
    output: &PathBuf,
    in_key: Option<&str>,
    out_key: Option<&str>,
) -> Result<()> {
    let start = Instant::now();
    let mask = Mask::load(input, in_key)
        .with_context(|| format!("cannot load mask from {}", input.display()))?;
    mask.save(output, out_key)
        .with_context(|| format!("cannot save mask to {}", output.display()))?;
    info!(
        "converted {} -> {} in {:.2?}",
        input.display(),
        output.display(),
        start.elapsed()
    );
    Ok(())
}

fn cmd_split(
    input: &PathBuf,
    key: Option<&str>,
    train_out: &PathBuf,
    test_out: &PathBuf,
    mode: &str,
    train_size: f64,
) -> Result<()> {
    let mode: SamplingMode = mode.parse()?;
    let mask = Mask::load(input, key)
        .with_context(|| format!("cannot load mask from {}", input.display()))?;
    let gt = mask.get_2d();

    let split = sample_gt(&gt, train_size, mode)?;
    info!(
        mode = %mode,
        train = split.train_count(),
        test = split.test_count(),
        "sampled ground truth"
    );

    write_label_map(train_out, &split.train_gt)
        .with_context(|| format!("cannot write {}", train_out.display()))?;
    write_label_map(test_out, &split.test_gt)
        .with_context(|| format!("cannot write {}", test_out.display()))?;
    Ok(())
}

fn cmd_patches(
    image: &PathBuf,
    mask_path: &PathBuf,
    key: Option<&str>,
    out_dir: &PathBuf,
    patch_size: usize,
    keep_background: bool,
) -> Result<()> {
    let cube = read_image_cube(image)
        .with_context(|| format!("cannot load image cube from {}", image.display()))?;

    // The mask file may be a full mask or a bare split output with gaps
    // in its class values, so fall back to the raw label-map reader.
    let gt = match Mask::load(mask_path, key) {
        Ok(mask) => mask.get_2d(),
        Err(_) => read_label_map(mask_path)
            .with_context(|| format!("cannot load labels from {}", mask_path.display()))?,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner());
    pb.set_message(format!("extracting {patch_size}x{patch_size} patches"));

    let start = Instant::now();
    let set = create_patches(&cube.view(), &gt.view(), patch_size, !keep_background)?;
    pb.finish_with_message(format!("{} patches in {:.2?}", set.len(), start.elapsed()));

    std::fs::create_dir_all(out_dir)?;
    let patches_path = out_dir.join("patches.npy");
    let labels_path = out_dir.join("labels.npy");
    set.data
        .write_npy(File::create(&patches_path)?)
        .context("cannot write patches.npy")?;
    set.labels
        .write_npy(File::create(&labels_path)?)
        .context("cannot write labels.npy")?;

    info!(
        "wrote {} and {}",
        patches_path.display(),
        labels_path.display()
    );
    Ok(())
}

/// Read an image cube from `.npy`, accepting f32 or f64 samples.
fn read_image_cube(path: &PathBuf) -> Result<Array3<f32>> {
    let file = File::open(path)?;
    if let Ok(cube) = Array3::<f32>::read_npy(file) {
        return Ok(cube);
    }
    let file = File::open(path)?;
    let cube = Array3::<f64>::read_npy(file).context("expected a 3D f32/f64 .npy array")?;
    Ok(cube.mapv(|v| v as f32))
}
