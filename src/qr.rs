use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Luma};
use qrcode::QrCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("failed to render QR image: {0}")]
    Render(#[from] image::ImageError),
}

/// Renders the URL as a black-on-white PNG QR code, returned as an
/// inline `data:image/png;base64,...` URL.
pub fn data_url(url: &str) -> Result<String, QrError> {
    let code = QrCode::new(url.as_bytes())?;
    let img = code.render::<Luma<u8>>().min_dimensions(200, 200).build();

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::L8,
    )?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}
