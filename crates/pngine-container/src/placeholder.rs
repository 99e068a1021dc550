//! Generated stand-in image for modules rendered without a GPU.

use crate::ContainerError;

/// Largest placeholder, in pixels (4096 x 4096).
pub const MAX_PIXELS: u64 = 1 << 24;

/// An RGBA gradient PNG of the given size.
pub fn placeholder(width: u32, height: u32) -> Result<Vec<u8>, ContainerError> {
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(ContainerError::ImageTooLarge { width, height });
    }
    let ramp = |v: u32, max: u32| (u64::from(v) * 255 / u64::from(max.saturating_sub(1).max(1))) as u8;

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[ramp(x, width), ramp(y, height), 0x80, 0xFF]);
        }
    }

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;

    Ok(out)
}
