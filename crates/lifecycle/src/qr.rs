//! QR payload rendering: raw pairing payload → PNG `data:` URL for `<img>`.

use {
    base64::{Engine as _, engine::general_purpose::STANDARD},
    image::{ImageBuffer, Luma},
    qrcode::{Color, EcLevel, QrCode},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(String),
    #[error("PNG encoding failed: {0}")]
    Png(String),
}

/// Render a raw QR payload as a PNG `data:` URL.
pub fn data_url(payload: &str) -> Result<String, QrError> {
    let png = png_bytes(payload)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Render a raw QR payload as PNG bytes with a quiet-zone border.
pub fn png_bytes(payload: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
        .map_err(|e| QrError::Encode(e.to_string()))?;

    let module_size: u32 = 8;
    let quiet_zone: u32 = 2;
    let modules = code.width() as u32;
    let img_size = (modules + quiet_zone * 2) * module_size;

    let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let mx = (x / module_size).saturating_sub(quiet_zone);
        let my = (y / module_size).saturating_sub(quiet_zone);

        if x / module_size < quiet_zone
            || y / module_size < quiet_zone
            || mx >= modules
            || my >= modules
        {
            Luma([255u8]) // White border
        } else {
            match code[(mx as usize, my as usize)] {
                Color::Dark => Luma([0u8]),
                Color::Light => Luma([255u8]),
            }
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| QrError::Png(e.to_string()))?;

    Ok(buf.into_inner())
}
