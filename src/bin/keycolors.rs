use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use keycolors::node::{INPUT_IMAGE, NUM_COLORS};
use keycolors::{ExtractKeyColors, ExtractOptions, ImageSource, Method, ParameterValue};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Extract the key colors of one or more images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of key colors to extract (1-12)
    #[arg(short = 'k', long)]
    num_colors: Option<i64>,

    /// Clustering method: kmeans or median-cut
    #[arg(short, long)]
    method: Option<Method>,

    /// Keep the clustering order instead of re-ranking by pixel frequency
    #[arg(long)]
    no_rerank: bool,

    /// Longest side of the analysed image, 0 to disable downscaling
    #[arg(long)]
    max_side: Option<u32>,

    /// RGB distance below which two colors count as the same
    #[arg(long)]
    distance: Option<f32>,

    /// JSON file with extraction options; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Set the log level
    #[arg(short, long, default_value = "warn")]
    log_level: Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install logger")?;

    let mut options = match &args.config {
        Some(path) => ExtractOptions::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExtractOptions::default(),
    };
    if let Some(method) = args.method {
        options.method = method;
    }
    if args.no_rerank {
        options.rerank = false;
    }
    if let Some(max_side) = args.max_side {
        options.max_side = max_side;
    }
    if let Some(distance) = args.distance {
        options.match_distance = distance;
    }
    let num_colors = args.num_colors.unwrap_or(options.num_colors as i64);

    let mut node = ExtractKeyColors::with_options(options);
    node.set_parameter_value(NUM_COLORS, ParameterValue::Int(num_colors))?;

    let mut report = Vec::new();
    for input in &args.inputs {
        node.set_parameter_value(INPUT_IMAGE, ParameterValue::Image(ImageSource::from(input.as_path())))?;
        let keys = node
            .process()
            .with_context(|| format!("extracting colors from {}", input.display()))?;

        if args.json {
            let colors: Vec<_> = node
                .color_outputs()
                .into_iter()
                .zip(&keys)
                .map(|((name, hex), key)| json!({ "name": name, "hex": hex, "rgb": key.color, "pixels": key.pixel_count }))
                .collect();
            report.push(json!({ "input": input.display().to_string(), "colors": colors }));
        } else {
            println!("{}", input.display());
            for (name, hex) in node.color_outputs() {
                println!("  {name}: {hex}");
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
