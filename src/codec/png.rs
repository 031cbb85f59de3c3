//! PNG source backend.
//!
//! Used when the crate is built without `heif`. EXIF lives in the `eXIf`
//! chunk as a bare TIFF structure.

use image::{DynamicImage, ImageFormat};

use super::{CodecError, Metadata, SourceDecoder};

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, Default)]
pub struct PngDecoder;

impl SourceDecoder for PngDecoder {
    fn name(&self) -> &'static str {
        "png"
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::Decode("empty input".into()));
        }
        Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?)
    }

    fn extract_metadata(&self, bytes: &[u8]) -> Result<Option<Metadata>, CodecError> {
        if !bytes.starts_with(&SIGNATURE) {
            return Err(CodecError::Metadata("not a PNG stream".into()));
        }

        let mut pos = SIGNATURE.len();
        while pos + 8 <= bytes.len() {
            let len = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]) as usize;
            let kind = &bytes[pos + 4..pos + 8];
            let start = pos + 8;
            // data + 4-byte CRC
            let end = match start.checked_add(len) {
                Some(end) if end + 4 <= bytes.len() => end,
                _ => {
                    return Err(CodecError::Metadata(format!(
                        "truncated {} chunk",
                        String::from_utf8_lossy(kind)
                    )))
                }
            };

            match kind {
                b"eXIf" => return Ok(Some(Metadata::from_tiff(&bytes[start..end]))),
                b"IEND" => break,
                _ => pos = end + 4,
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &b in bytes {
            crc ^= b as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            }
        }
        !crc
    }

    /// PNG test image, optionally carrying `tiff` in an `eXIf` chunk.
    pub(crate) fn png_with_exif(width: u32, height: u32, tiff: Option<&[u8]>) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let Some(tiff) = tiff else { return png };

        // Signature (8) + IHDR chunk (25).
        let split = 33;
        let mut chunk = Vec::new();
        chunk.extend_from_slice(&(tiff.len() as u32).to_be_bytes());
        let mut body = b"eXIf".to_vec();
        body.extend_from_slice(tiff);
        chunk.extend_from_slice(&body);
        chunk.extend_from_slice(&crc32(&body).to_be_bytes());

        let mut out = png[..split].to_vec();
        out.extend_from_slice(&chunk);
        out.extend_from_slice(&png[split..]);
        out
    }

    pub(crate) const TIFF: &[u8] = b"MM\0*\0\0\0\x08\0\x01\x01\x0f\0\x02\0\0\0\x04ACME\0\0\0\0";

    #[test]
    fn decodes_png() {
        let img = PngDecoder.decode(&png_with_exif(8, 4, None)).unwrap();
        assert_eq!((img.width(), img.height()), (8, 4));
    }

    #[test]
    fn decode_rejects_garbage_and_empty_input() {
        assert!(PngDecoder.decode(b"definitely not an image").is_err());
        assert!(matches!(PngDecoder.decode(&[]), Err(CodecError::Decode(_))));
    }

    #[test]
    fn finds_exif_chunk() {
        let png = png_with_exif(8, 4, Some(TIFF));
        let metadata = PngDecoder.extract_metadata(&png).unwrap().unwrap();
        assert_eq!(metadata, Metadata::from_tiff(TIFF));
        // The chunk must not break decoding.
        assert!(PngDecoder.decode(&png).is_ok());
    }

    #[test]
    fn missing_exif_is_none() {
        let png = png_with_exif(8, 4, None);
        assert!(PngDecoder.extract_metadata(&png).unwrap().is_none());
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let png = png_with_exif(8, 4, Some(TIFF));
        assert!(PngDecoder.extract_metadata(&png[..50]).is_err());
        assert!(PngDecoder.extract_metadata(b"nope").is_err());
    }
}
