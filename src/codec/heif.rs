//! HEIF/HEIC source backend (libheif).
//!
//! HEIF stores EXIF as an item whose payload starts with a big-endian
//! offset to the TIFF header. The block is normalized to APP1 form so it can
//! be written into the JPEG unchanged.

use image::{DynamicImage, RgbImage};
use libheif_rs::{ColorSpace, HeifContext, ItemId, LibHeif, RgbChroma};

use super::{CodecError, Metadata, SourceDecoder};

#[derive(Debug, Clone, Copy, Default)]
pub struct HeifDecoder;

impl HeifDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn heif_err(e: libheif_rs::HeifError) -> CodecError {
    CodecError::Decode(e.to_string())
}

impl SourceDecoder for HeifDecoder {
    fn name(&self) -> &'static str {
        "heif"
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::Decode("empty input".into()));
        }

        let ctx = HeifContext::read_from_bytes(bytes).map_err(heif_err)?;
        let handle = ctx.primary_image_handle().map_err(heif_err)?;
        let decoded = LibHeif::new()
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(heif_err)?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| CodecError::Decode("decoded image has no interleaved plane".into()))?;

        let (width, height, stride) = (plane.width, plane.height, plane.stride);
        let row = width as usize * 3;
        let mut pixels = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            pixels.extend_from_slice(&plane.data[y * stride..y * stride + row]);
        }

        RgbImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| CodecError::Decode("pixel buffer does not match image size".into()))
    }

    fn extract_metadata(&self, bytes: &[u8]) -> Result<Option<Metadata>, CodecError> {
        let ctx = HeifContext::read_from_bytes(bytes).map_err(heif_err)?;
        let handle = ctx.primary_image_handle().map_err(heif_err)?;

        let mut ids: [ItemId; 1] = [0];
        if handle.metadata_block_ids(&mut ids, b"Exif") == 0 {
            return Ok(None);
        }
        let block = handle
            .metadata(ids[0])
            .map_err(|e| CodecError::Metadata(e.to_string()))?;

        exif_item_to_metadata(&block).map(Some)
    }
}

/// Strip the 4-byte TIFF offset (and whatever it skips, usually `Exif\0\0`)
/// from a HEIF EXIF item.
fn exif_item_to_metadata(block: &[u8]) -> Result<Metadata, CodecError> {
    if block.len() < 4 {
        return Err(CodecError::Metadata("EXIF item shorter than its header".into()));
    }
    let offset = u32::from_be_bytes([block[0], block[1], block[2], block[3]]) as usize;
    let tiff = 4usize
        .checked_add(offset)
        .and_then(|start| block.get(start..))
        .filter(|tiff| !tiff.is_empty())
        .ok_or_else(|| CodecError::Metadata(format!("TIFF offset {offset} out of range")))?;

    Ok(Metadata::from_tiff(tiff))
}
