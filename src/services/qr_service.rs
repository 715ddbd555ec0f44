use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;

use crate::error::{AppError, AppResult};

/// Renders a short string (a container scan code) as a PNG QR image.
pub fn generate_qr_png(data: &str) -> AppResult<Vec<u8>> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::InvalidInput(format!("Cannot encode QR payload: {}", e)))?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(200, 200)
        .build();

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("QR rendering failed: {}", e)))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn renders_png_bytes() {
        let png = generate_qr_png("BOX-0001").unwrap();
        assert!(png.len() > PNG_MAGIC.len());
        assert_eq!(&png[..PNG_MAGIC.len()], PNG_MAGIC);
    }

    #[test]
    fn different_codes_render_different_images() {
        let a = generate_qr_png("BOX-0001").unwrap();
        let b = generate_qr_png("BOX-0002").unwrap();
        assert_ne!(a, b);
    }
}
