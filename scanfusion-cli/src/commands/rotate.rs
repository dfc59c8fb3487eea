use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use image::GrayImage;
use scanfusion_core::rotate;
use std::path::Path;
use tracing::info;

/// Rotate `input`'s luminance by `degrees` and save it to `output`
///
/// Returns the output dimensions.
pub fn execute(input: &Path, degrees: i32, output: &Path) -> Result<(u32, u32)> {
    info!("Rotating {} by {}°", input.display(), degrees);

    let luma = image::open(input)
        .with_context(|| format!("Failed to decode image: {}", input.display()))?
        .into_luma8();
    let (width, height) = (luma.width() as usize, luma.height() as usize);

    let rotated = rotate(Bytes::from(luma.into_raw()), width, height, degrees)
        .context("Failed to rotate luminance")?;
    let (out_width, out_height) = (rotated.width() as u32, rotated.height() as u32);
    let image = GrayImage::from_raw(out_width, out_height, rotated.pixels().to_vec())
        .ok_or_else(|| anyhow!("Rotated buffer does not match its dimensions"))?;

    image
        .save(output)
        .with_context(|| format!("Failed to write output image: {}", output.display()))?;

    info!(
        "Wrote {}x{} image to {}",
        out_width,
        out_height,
        output.display()
    );
    Ok((out_width, out_height))
}
