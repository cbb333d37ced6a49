/* Copyright 2020 @TwoCookingMice */

use crate::math::constants::Float;

use exr::prelude::*;

// In-memory RGBA pixel rectangle used by the EXR helpers.
#[derive(Debug)]
pub struct RgbaBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<(Float, Float, Float, Float)>,
}

// Read EXR image from file
pub fn read_rgba_from_file(file_path: &str) -> std::result::Result<RgbaBuffer, String> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _| RgbaBuffer {
                width: resolution.width(),
                height: resolution.height(),
                data: vec![(0.0, 0.0, 0.0, 0.0); resolution.width() * resolution.height()],
            },
            |image, position, (r, g, b, a): (f32, f32, f32, f32)| {
                let idx = position.y() * image.width + position.x();
                image.data[idx] = (r, g, b, a);
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_file(file_path)
        .map_err(|e| format!("failed to read exr {}: {}", file_path, e))?;

    Ok(image.layer_data.channel_data.pixels)
}

// Write EXR image to file
pub fn write_rgba_to_file(
    image: &[(Float, Float, Float, Float)],
    width: usize,
    height: usize,
    file_path: &str,
) {
    log::info!("Starting writing openexr images: {}.", file_path);

    let write_result = write_rgba_file(file_path, width, height, |x, y| image[y * width + x]);
    match write_result {
        Ok(()) => println!("EXR written to: {}.", file_path),
        Err(e) => println!("EXR written error: {}.", e.to_string()),
    }
}
