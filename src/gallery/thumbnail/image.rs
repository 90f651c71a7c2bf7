use super::{ThumbnailError, ThumbnailSpec};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Decode photo bytes, normalize orientation, fit to the target box, and
/// re-encode as JPEG.
pub(super) fn render_photo_thumbnail(
    bytes: &[u8],
    spec: &ThumbnailSpec,
) -> Result<Vec<u8>, ThumbnailError> {
    let upright = decode_upright(bytes)?;

    // Fit: scale to cover the box, then crop the longer dimension.
    let fitted = upright.resize_to_fill(spec.width, spec.height, FilterType::Lanczos3);
    debug!(
        "thumbnail {}x{} from source {}x{}",
        fitted.width(),
        fitted.height(),
        upright.width(),
        upright.height()
    );

    encode_jpeg(&fitted, spec.jpeg_quality)
}

/// Decode with the camera-recorded orientation applied, so downstream code
/// always sees a visually upright image.
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, ThumbnailError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or(ThumbnailError::UnsupportedFormat)?;
    match format {
        ImageFormat::Jpeg
        | ImageFormat::Png
        | ImageFormat::Bmp
        | ImageFormat::WebP
        | ImageFormat::Gif
        | ImageFormat::Tiff => {}
        _ => return Err(ThumbnailError::UnsupportedFormat),
    }

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation().ok();
    let mut image = DynamicImage::from_decoder(decoder)?;
    if let Some(orientation) = orientation {
        image.apply_orientation(orientation);
    }

    Ok(image)
}

pub(super) fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(buffer.into_inner())
}
