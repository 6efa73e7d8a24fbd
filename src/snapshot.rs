use std::io::Cursor;

use anyhow::{Context, Result};
use image::RgbImage;

/// Encode a captured frame as an in-memory PNG blob at its current pixel
/// dimensions. Callers attach the returned bytes to a request form only after
/// this completes, so a submission can never race the encode.
pub fn encode_png(frame: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .context("Failed to encode snapshot as PNG")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn encodes_well_formed_png() {
        let frame = RgbImage::from_fn(4, 3, |x, y| image::Rgb([x as u8, y as u8, 0]));
        let png = encode_png(&frame).unwrap();

        assert_eq!(&png[..8], &PNG_SIGNATURE);

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
    }
}
