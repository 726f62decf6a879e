//! Headless snapshot renderer: generates a world and writes one frame as PNG.
//!
//! Usage: cargo run --release --bin render_snapshot -- [config.json] [out.png] [OPTIONS]
//!
//! Options:
//!   --width <PX>      Image width (default: 640)
//!   --height <PX>     Image height (default: 360)
//!   --gpu             Run the composite stage on the GPU when available
//!   --raster-only     Skip the traced composite
//!   --debug-view      Write the pure traced volume view instead

use std::path::{Path, PathBuf};
use std::time::Instant;

use glam::Vec3;

use voxray::core::camera::Camera;
use voxray::core::config::EngineConfig;
use voxray::core::error::Error;
use voxray::core::logging;
use voxray::core::types::Result;
use voxray::render::{render_debug_view, FrameLighting};
use voxray::VoxelEngine;

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("render_snapshot failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let positional = positional_args(&args);
    let config_path = positional.iter().find(|a| a.ends_with(".json"));
    let out_path = positional
        .iter()
        .find(|a| !a.ends_with(".json"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("snapshot.png"));
    let width = parse_u32_arg(&args, "--width")?.unwrap_or(640);
    let height = parse_u32_arg(&args, "--height")?.unwrap_or(360);
    let use_gpu = args.iter().any(|a| a == "--gpu");
    let raster_only = args.iter().any(|a| a == "--raster-only");
    let debug_view = args.iter().any(|a| a == "--debug-view");

    let mut config = match config_path {
        Some(path) => EngineConfig::load(Path::new(path))?,
        None => EngineConfig::default(),
    };
    config.render.enabled_on_start = !raster_only;

    let mut engine = if use_gpu {
        VoxelEngine::with_gpu(&config, (width, height))
    } else {
        VoxelEngine::new(&config, (width, height))
    };

    let start = Instant::now();
    let generated = engine.ensure_chunks_around(0.0, 0.0);
    log::info!(
        "Generated {} chunks ({} triangles) in {:.2?}",
        generated,
        engine.world().meshes().triangle_count(),
        start.elapsed()
    );

    let eye = engine.world().spawn_point(0, 0, 12.0);
    let target = Vec3::new(24.0, eye.y - 10.0, 24.0);
    let mut camera = Camera::look_at(eye, target, Vec3::Y);
    camera.set_aspect(width as f32, height as f32);
    let lighting = FrameLighting::from_config(&engine.config().render);

    let start = Instant::now();
    let rgba = if debug_view {
        engine.update_volume_if_needed(camera.position);
        let max_steps = engine.config().render.max_steps;
        let pixels = render_debug_view(engine.volume(), &camera, &lighting, max_steps, (width, height));
        to_rgba8(&pixels)
    } else {
        let report = engine.render_frame(&camera, &lighting);
        log::info!("Frame {} rendered in {:?} mode", report.frame_index, report.mode);
        if report.fell_back {
            log::warn!("Composite failed, frame is raster-only");
        }
        engine.compositor().targets().display_rgba8()
    };
    log::info!("Rendered {}x{} in {:.2?}", width, height, start.elapsed());

    let image = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| Error::Image("pixel buffer does not match image size".into()))?;
    image
        .save(&out_path)
        .map_err(|e| Error::Image(e.to_string()))?;
    log::info!("Wrote {}", out_path.display());
    Ok(())
}

fn to_rgba8(pixels: &[Vec3]) -> Vec<u8> {
    pixels
        .iter()
        .flat_map(|c| {
            let c = c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
            [c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]
        })
        .collect()
}

/// Arguments that are neither flags nor flag values
fn positional_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--width" || arg == "--height" {
            skip_next = true;
            continue;
        }
        if !arg.starts_with("--") {
            out.push(arg.clone());
        }
    }
    out
}

/// Value of `--name <N>`; a present flag must carry a positive integer
fn parse_u32_arg(args: &[String], name: &str) -> Result<Option<u32>> {
    let Some(i) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    args.get(i + 1)
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&v| v > 0)
        .map(Some)
        .ok_or_else(|| Error::Config(format!("{} expects a positive integer", name)))
}
