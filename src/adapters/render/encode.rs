use base64::{prelude::BASE64_STANDARD, Engine};
use image::RgbImage;

use crate::domain::errors::{DomainError, DomainResult};

/// Encodes the image as JPEG and wraps it in a `data:` URI for inline `<img>` tags.
pub fn jpeg_data_uri(image: &RgbImage, quality: u8) -> DomainResult<String> {
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode_image(image)
        .map_err(|e| DomainError::OperationFailed(format!("jpeg encode: {e}")))?;
    Ok(format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(buf)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_decodable_jpeg() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([200, 10, 10]));
        let uri = jpeg_data_uri(&img, 85).unwrap();
        let payload = uri.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = BASE64_STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }
}
