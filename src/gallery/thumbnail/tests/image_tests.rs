use crate::gallery::thumbnail::{ThumbnailError, ThumbnailSpec, Thumbnailer};
use crate::media::MediaKind;
use image::{Rgb, RgbImage};

fn spec() -> ThumbnailSpec {
    ThumbnailSpec {
        width: 370,
        height: 280,
        jpeg_quality: 85,
        video_tool: "ffmpeg".to_string(),
        video_seek_seconds: 1.0,
    }
}

fn thumbnailer() -> Thumbnailer {
    Thumbnailer::new(spec())
}

const RED: Rgb<u8> = Rgb([220, 30, 30]);
const BLUE: Rgb<u8> = Rgb([30, 30, 220]);

/// An image whose top half is red and bottom half is blue, so rotations are
/// observable after decoding.
fn half_and_half(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        if y < height / 2 { RED } else { BLUE }
    })
}

fn encode_jpeg(image: &RgbImage) -> Vec<u8> {
    use image::ImageEncoder;
    let mut buffer = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 95);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buffer.into_inner()
}

/// Splice a minimal EXIF APP1 segment carrying only the orientation tag
/// right after the JPEG SOI marker.
fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "expected SOI");

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&0x2A_u16.to_le_bytes());
    tiff.extend_from_slice(&8_u32.to_le_bytes()); // IFD0 offset
    tiff.extend_from_slice(&1_u16.to_le_bytes()); // one entry
    tiff.extend_from_slice(&0x0112_u16.to_le_bytes()); // Orientation
    tiff.extend_from_slice(&3_u16.to_le_bytes()); // SHORT
    tiff.extend_from_slice(&1_u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]); // value padding
    tiff.extend_from_slice(&0_u32.to_le_bytes()); // no next IFD

    let payload_len = 2 + 6 + tiff.len() as u16;
    let mut out = Vec::with_capacity(jpeg.len() + payload_len as usize + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&payload_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn is_reddish(pixel: Rgb<u8>) -> bool {
    pixel[0] > 150 && pixel[2] < 110
}

fn is_bluish(pixel: Rgb<u8>) -> bool {
    pixel[2] > 150 && pixel[0] < 110
}

#[tokio::test]
async fn photo_thumbnail_has_exact_box_dimensions_and_decodes() {
    let source = half_and_half(800, 600);
    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(source)
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();

    let thumbnail = thumbnailer()
        .generate(png.into_inner(), MediaKind::Photo)
        .await
        .unwrap();

    let decoded = image::load_from_memory(&thumbnail).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (370, 280));
    assert_eq!(
        image::guess_format(&thumbnail).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[tokio::test]
async fn portrait_source_is_cropped_to_the_box_not_squashed() {
    let source = half_and_half(300, 900);
    let jpeg = encode_jpeg(&source);

    let thumbnail = thumbnailer().generate(jpeg, MediaKind::Photo).await.unwrap();

    let decoded = image::load_from_memory(&thumbnail).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (370, 280));
}

#[tokio::test]
async fn rotated_inputs_come_out_upright() {
    // Orientation 6: stored sideways, must rotate 90 degrees clockwise to
    // display. The stored top edge (red) ends up on the right.
    let portrait = encode_jpeg(&half_and_half(280, 370));
    let rotated = with_exif_orientation(&portrait, 6);
    let thumbnail = thumbnailer().generate(rotated, MediaKind::Photo).await.unwrap();
    let decoded = image::load_from_memory(&thumbnail).unwrap().to_rgb8();
    assert_eq!((decoded.width(), decoded.height()), (370, 280));
    assert!(is_reddish(*decoded.get_pixel(340, 140)), "red on the right");
    assert!(is_bluish(*decoded.get_pixel(30, 140)), "blue on the left");

    // Orientation 8: rotate 270 degrees clockwise; the red edge lands left.
    let rotated = with_exif_orientation(&portrait, 8);
    let thumbnail = thumbnailer().generate(rotated, MediaKind::Photo).await.unwrap();
    let decoded = image::load_from_memory(&thumbnail).unwrap().to_rgb8();
    assert!(is_reddish(*decoded.get_pixel(30, 140)), "red on the left");
    assert!(is_bluish(*decoded.get_pixel(340, 140)), "blue on the right");

    // Orientation 3: upside down; red moves to the bottom.
    let landscape = encode_jpeg(&half_and_half(370, 280));
    let flipped = with_exif_orientation(&landscape, 3);
    let thumbnail = thumbnailer().generate(flipped, MediaKind::Photo).await.unwrap();
    let decoded = image::load_from_memory(&thumbnail).unwrap().to_rgb8();
    assert!(is_bluish(*decoded.get_pixel(185, 20)), "blue on top");
    assert!(is_reddish(*decoded.get_pixel(185, 260)), "red on the bottom");
}

#[tokio::test]
async fn rotated_input_matches_equivalent_unrotated_input() {
    // The orientation-6 portrait above, pre-rotated by hand: left blue,
    // right red. Both paths must agree once normalized.
    let upright = RgbImage::from_fn(370, 280, |x, _| if x < 185 { BLUE } else { RED });
    let thumbnail = thumbnailer()
        .generate(encode_jpeg(&upright), MediaKind::Photo)
        .await
        .unwrap();
    let decoded = image::load_from_memory(&thumbnail).unwrap().to_rgb8();

    assert!(is_bluish(*decoded.get_pixel(30, 140)));
    assert!(is_reddish(*decoded.get_pixel(340, 140)));
}

#[tokio::test]
async fn unrecognizable_bytes_fail_as_unsupported() {
    let result = thumbnailer()
        .generate(b"definitely not an image".to_vec(), MediaKind::Photo)
        .await;
    assert!(matches!(result, Err(ThumbnailError::UnsupportedFormat)));
}

#[tokio::test]
async fn corrupt_image_body_fails_as_decode_error() {
    // Valid PNG signature, garbage body.
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0xAB; 64]);

    let result = thumbnailer().generate(bytes, MediaKind::Photo).await;
    assert!(matches!(result, Err(ThumbnailError::Decode(_))));
}
