/* Copyright 2020 @TwoCookingMice */

use crate::math::bitmap::Bitmap;

use exr::prelude::*;

// Write the rendered film to an OpenEXR file.
pub fn write_exr_to_file(bitmap: &Bitmap, file_path: &str) -> Result<()> {
    log::info!("Writing OpenEXR image ({}x{}) to: {}.",
               bitmap.width(), bitmap.height(), file_path);

    let width = bitmap.width();
    let pixels = bitmap.raw_copy();
    write_rgb_file(file_path, width, bitmap.height(), |x, y| pixels[y * width + x])?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}
