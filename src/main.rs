use chromagene::{batch, AnalysisError};
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};

/// Print the palette, histograms and lightness/chroma heatmap of images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Drop pixels matching a uniform border color before analyzing
    #[arg(short, long)]
    remove_background: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let images = args.inputs.into_iter().map(|path| {
        let image = chromagene::image::open(&path)
            .map(|image| image.to_rgba8())
            .map_err(|source| AnalysisError::Decode {
                path: path.clone(),
                source,
            });

        (path, image)
    });

    let report = batch::analyze_batch(images, args.remove_background);

    for (path, analysis) in report.results() {
        println!("{}", path.display());
        println!("  pixels: {:.1}", analysis.pixel_count());

        if let Some(background) = analysis.background() {
            println!("  background: {:?}", background.lab());
        }

        for swatch in analysis.palette() {
            println!("  {} {:>6.2}%", swatch.hex(), swatch.ratio() * 100.0);
        }

        println!("  lightness: {:?}", analysis.lightness_bins());
        println!("  chroma: {:?}", analysis.saturation_bins());

        if let Some(cells) = analysis.heatmap_cells() {
            for row in cells {
                let row = row.iter().map(ToString::to_string).collect::<Vec<_>>();
                println!("  {}", row.join(" "));
            }
        }
    }

    if report.failed() > 0 {
        eprintln!("{} images failed to load or analyze and were skipped", report.failed());
    }

    if report.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
