// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands driving the pipeline over the synthetic sensor
//!
//! This module provides command-line functionality for:
//! - Processing a fixed number of frames and saving the layers
//! - Watching the live depth readout
//! - Printing the effective settings

use chrono::Local;
use depth_layers::backends::sensor::{
    ChannelOrder, ColorFormat, DepthFormat, OccupantScene, ScaledRegistration, SyntheticSource,
};
use depth_layers::constants::streams;
use depth_layers::media::{flatten_layers, save_layers_png};
use depth_layers::{
    FrameOutcome, FrameReport, FrameSource, Layer, LayerSet, SegmentationConfig, SegmentationLoop,
    SegmentationPipeline,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Load settings from a file (if given) and apply the threshold override
pub fn load_config(
    path: Option<&Path>,
    threshold: Option<u32>,
) -> Result<SegmentationConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => SegmentationConfig::load(path)?,
        None => SegmentationConfig::default(),
    };
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }
    Ok(config)
}

/// Synthetic sensor at the reference stream resolution
fn synthetic_sensor() -> SyntheticSource {
    SyntheticSource::new(
        DepthFormat::new(streams::DEPTH_WIDTH, streams::DEPTH_HEIGHT),
        ColorFormat::new(streams::COLOR_WIDTH, streams::COLOR_HEIGHT, ChannelOrder::Bgra),
    )
    .with_registration(ScaledRegistration::new(-8, 4))
    .with_scene(OccupantScene::default())
}

/// Process `frames` frames and save the final layers
pub fn run_frames(
    config: SegmentationConfig,
    frames: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = SegmentationPipeline::new(synthetic_sensor(), config)?;
    let order = pipeline.source().color_format().channel_order;

    println!("Threshold: {} mm", pipeline.threshold().get());

    let mut last_report: Option<FrameReport> = None;
    for _ in 0..frames {
        if let FrameOutcome::Published(report) = pipeline.process_frame()? {
            last_report = Some(report);
        }
    }

    let stats = pipeline.stats();
    println!(
        "Frames: {} published, {} skipped",
        stats.published, stats.skipped
    );

    let Some(report) = last_report else {
        println!("No frames published.");
        return Ok(());
    };

    println!("{}", report.readout);
    let per_layer: Vec<String> = Layer::ALL
        .iter()
        .map(|&layer| format!("{}={}", layer.name(), report.counts.get(layer)))
        .collect();
    println!(
        "Last frame: {} unmapped={}",
        per_layer.join(" "),
        report.counts.unmapped
    );

    let output_dir = output.unwrap_or_else(default_output_dir);
    let paths = save_layers_png(pipeline.layers(), order, &output_dir, "frame")?;
    let preview_path = output_dir.join("frame_composite.png");
    flatten_layers(pipeline.layers(), order)?.save(&preview_path)?;

    for path in paths.iter().chain(std::iter::once(&preview_path)) {
        println!("Saved: {}", path.display());
    }

    Ok(())
}

/// Run the processing loop until Ctrl+C, printing the readout
pub fn watch(config: SegmentationConfig) -> Result<(), Box<dyn std::error::Error>> {
    let interval = config.frame_interval();
    let pipeline = SegmentationPipeline::new(synthetic_sensor(), config)?;

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!("Watching... (press Ctrl+C to stop)");
    let segmentation = SegmentationLoop::start(
        pipeline,
        interval,
        |_: &LayerSet, report: &FrameReport| {
            print!(
                "\r{}  (threshold {} mm, near {:>6}, far {:>6})",
                report.readout,
                report.threshold,
                report.counts.near_occupant,
                report.counts.far_occupant
            );
            let _ = std::io::Write::flush(&mut std::io::stdout());
        },
    );

    while !stop_flag.load(Ordering::SeqCst) && segmentation.is_running() {
        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    let stats = segmentation.stop();
    println!(
        "Frames: {} published, {} skipped",
        stats.published, stats.skipped
    );
    Ok(())
}

/// Print the effective settings
pub fn print_config(config: &SegmentationConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config.to_json_string()?);
    Ok(())
}

fn default_output_dir() -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("layers_{}", timestamp))
}
