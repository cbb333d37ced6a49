// Copyright @yucwang 2026

use millefeuille::core::table_loader::load_texture_manifest;
use millefeuille::core::texture::Differential2;
use millefeuille::io::exr_utils;
use millefeuille::math::constants::{Float, Vector2f};

use indicatif::{ProgressBar, ProgressStyle};
use std::env;

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <textures.xml> <output.exr> (--texture NAME | --udim NAME) [--width N] [--height N] [--uv-scale S]",
            args[0]
        );
        std::process::exit(1);
    }

    let manifest_path = &args[1];
    let output_path = &args[2];
    let mut texture_name: Option<String> = None;
    let mut udim_name: Option<String> = None;
    let mut width: usize = 512;
    let mut height: usize = 512;
    let mut uv_scale: Float = 1.0;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--texture" => {
                i += 1;
                texture_name = args.get(i).cloned();
            }
            "--udim" => {
                i += 1;
                udim_name = args.get(i).cloned();
            }
            "--width" => {
                i += 1;
                width = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(512);
            }
            "--height" => {
                i += 1;
                height = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(512);
            }
            "--uv-scale" => {
                i += 1;
                uv_scale = args.get(i).and_then(|v| v.parse::<Float>().ok()).unwrap_or(1.0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if texture_name.is_none() && udim_name.is_none() {
        eprintln!("One of --texture or --udim is required.");
        std::process::exit(1);
    }

    let set = match load_texture_manifest(manifest_path) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Failed to load manifest {}: {:?}", manifest_path, e);
            std::process::exit(1);
        }
    };
    let sampler = set.sampler();

    let texture_id = texture_name.as_ref().map(|name| match set.texture_id(name) {
        Some(id) => id,
        None => {
            eprintln!("Unknown texture: {}", name);
            std::process::exit(1);
        }
    });
    let image_id = udim_name.as_ref().map(|name| match set.udim_image_id(name) {
        Some(id) => id,
        None => {
            eprintln!("Unknown udim image: {}", name);
            std::process::exit(1);
        }
    });

    // One probe sample per output pixel; the derivatives are the
    // grid spacing.
    let duv = Differential2 {
        dx: Vector2f::new(uv_scale / width as Float, 0.0),
        dy: Vector2f::new(0.0, uv_scale / height as Float),
    };

    let progress = ProgressBar::new(height as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut output = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let uv = Vector2f::new(
                (x as Float + 0.5) / width as Float * uv_scale,
                (y as Float + 0.5) / height as Float * uv_scale,
            );
            let color = match (texture_id, image_id) {
                (Some(id), _) => sampler.sample(id, uv, duv),
                (None, Some(id)) => sampler.sample_udim(id, uv, duv),
                (None, None) => unreachable!(),
            };
            output.push((color.r(), color.g(), color.b(), color.a()));
        }
        progress.inc(1);
    }
    progress.finish();

    exr_utils::write_rgba_to_file(&output, width, height, output_path);
}
