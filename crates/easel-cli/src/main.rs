//! Headless CLI over the easel engine.
//!
//! `easel bounds` computes the printable region of a mask image;
//! `easel compose` builds a design from files and writes a preview PNG
//! and, optionally, the snapshot JSON.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use easel_canvas::{TextStyle, encode_png};
use easel_engine::{DesignEngine, EngineConfig, UploadFile};

#[derive(Parser)]
#[command(name = "easel", version, about = "Design-canvas engine, headless")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the printable region a mask defines on a canvas, as JSON.
    Bounds {
        /// Mask image file.
        #[arg(long)]
        mask: PathBuf,
        /// Canvas width in pixels.
        #[arg(long, default_value_t = 800)]
        width: u32,
        /// Canvas height in pixels.
        #[arg(long, default_value_t = 800)]
        height: u32,
    },
    /// Compose a design and write a preview PNG.
    Compose {
        /// Background product image.
        #[arg(long)]
        background: Option<PathBuf>,
        /// Printable-area mask image.
        #[arg(long)]
        mask: Option<PathBuf>,
        /// Image to place on the design; repeatable.
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Text to place on the design; repeatable.
        #[arg(long = "text")]
        texts: Vec<String>,
        /// Canvas width in pixels.
        #[arg(long, default_value_t = 800)]
        width: u32,
        /// Canvas height in pixels.
        #[arg(long, default_value_t = 800)]
        height: u32,
        /// Preview PNG output path.
        #[arg(long, default_value = "preview.png")]
        out: PathBuf,
        /// Also write the design snapshot JSON here.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Bounds {
            mask,
            width,
            height,
        } => bounds(&mask, width, height),
        Command::Compose {
            background,
            mask,
            images,
            texts,
            width,
            height,
            out,
            snapshot,
        } => compose(
            background.as_deref(),
            mask.as_deref(),
            &images,
            &texts,
            (width, height),
            &out,
            snapshot.as_deref(),
        ),
    }
}

fn bounds(mask: &Path, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
    let mut engine = DesignEngine::new(EngineConfig::default(), (width, height), "cli");
    engine.load_fixed_layers(None, Some(&fs::read(mask)?))?;
    match engine.clip_bounds() {
        Some(bounds) => println!("{}", serde_json::to_string_pretty(&bounds)?),
        None => println!("null"),
    }
    Ok(())
}

fn compose(
    background: Option<&Path>,
    mask: Option<&Path>,
    images: &[PathBuf],
    texts: &[String],
    canvas: (u32, u32),
    out: &Path,
    snapshot: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut engine = DesignEngine::new(EngineConfig::default(), canvas, "cli");

    let background = background.map(fs::read).transpose()?;
    let mask = mask.map(fs::read).transpose()?;
    if background.is_some() || mask.is_some() {
        engine.load_fixed_layers(background.as_deref(), mask.as_deref())?;
    }

    let files = images
        .iter()
        .map(|path| {
            Ok(UploadFile {
                name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                bytes: fs::read(path)?,
            })
        })
        .collect::<Result<Vec<_>, std::io::Error>>()?;
    if !files.is_empty() {
        let report = engine.upload_images(&files)?;
        info!(
            "added {} image(s), skipped {} duplicate(s)",
            report.added, report.duplicates
        );
        for error in &report.rejected {
            eprintln!("rejected: {error}");
        }
        for name in &report.low_resolution {
            eprintln!("warning: {name} is below the print resolution floor");
        }
    }

    for text in texts {
        engine.add_text(text, TextStyle::default());
    }

    fs::write(out, encode_png(&engine.render_preview())?)?;
    if let Some(path) = snapshot {
        fs::write(path, engine.design_data()?.snapshot)?;
    }

    let stats = engine.stats();
    println!(
        "composed {} object(s): {} image(s), {} text(s); preview written to {}",
        stats.total_objects,
        stats.images,
        stats.texts,
        out.display()
    );
    Ok(())
}
