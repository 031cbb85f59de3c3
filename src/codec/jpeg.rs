//! JPEG target encoder.
//!
//! # Responsibilities
//! - Encode decoded pixels as baseline JPEG
//! - Inject an EXIF block as an APP1 segment right after SOI
//! - Read an APP1 EXIF block back out of a JPEG stream

use std::io::{self, Write};

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use super::{CodecError, Metadata, EXIF_HEADER};

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// Largest payload an APP1 segment can hold; its length field is 16 bits
/// and counts itself.
pub const MAX_APP1_PAYLOAD: usize = u16::MAX as usize - 2;

/// Encoder for the service's target format.
#[derive(Debug, Clone, Copy)]
pub struct JpegTarget {
    quality: u8,
}

impl JpegTarget {
    pub const EXTENSION: &'static str = "jpg";
    pub const CONTENT_TYPE: &'static str = "image/jpeg";

    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Whether `metadata` fits in a single APP1 segment.
    pub fn can_embed(metadata: &Metadata) -> bool {
        metadata.as_bytes().len() <= MAX_APP1_PAYLOAD
    }

    /// Encode `image`, embedding `metadata` when present.
    pub fn encode(
        &self,
        image: &DynamicImage,
        metadata: Option<&Metadata>,
    ) -> Result<Vec<u8>, CodecError> {
        // JPEG has no alpha channel.
        let rgb = image.to_rgb8();
        let mut writer = ExifWriter::new(Vec::new(), metadata)?;
        JpegEncoder::new_with_quality(&mut writer, self.quality).encode_image(&rgb)?;
        Ok(writer.into_inner())
    }
}

impl Default for JpegTarget {
    fn default() -> Self {
        Self::new(75)
    }
}

/// Writer that splices an APP1 EXIF segment in after the SOI marker of the
/// JPEG stream passing through it.
///
/// Without metadata it forwards bytes untouched.
pub struct ExifWriter<W: Write> {
    inner: W,
    segment: Option<Vec<u8>>,
    soi_seen: usize,
}

impl<W: Write> ExifWriter<W> {
    pub fn new(inner: W, metadata: Option<&Metadata>) -> Result<Self, CodecError> {
        let segment = metadata.map(app1_segment).transpose()?;
        Ok(Self {
            inner,
            segment,
            soi_seen: 0,
        })
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ExifWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.segment.is_none() {
            return self.inner.write(buf);
        }

        let mut consumed = 0;
        while self.soi_seen < SOI.len() && consumed < buf.len() {
            if buf[consumed] != SOI[self.soi_seen] {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "encoder output does not start with SOI",
                ));
            }
            self.soi_seen += 1;
            consumed += 1;
        }

        if self.soi_seen == SOI.len() {
            if let Some(segment) = self.segment.take() {
                self.inner.write_all(&SOI)?;
                self.inner.write_all(&segment)?;
            }
        }
        Ok(consumed)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn app1_segment(metadata: &Metadata) -> Result<Vec<u8>, CodecError> {
    if !JpegTarget::can_embed(metadata) {
        return Err(CodecError::Metadata(format!(
            "EXIF block of {} bytes does not fit in an APP1 segment",
            metadata.as_bytes().len()
        )));
    }

    let len = metadata.as_bytes().len() + 2;
    let mut segment = Vec::with_capacity(len + 2);
    segment.extend_from_slice(&[0xFF, APP1]);
    segment.extend_from_slice(&(len as u16).to_be_bytes());
    segment.extend_from_slice(metadata.as_bytes());
    Ok(segment)
}

/// Find the first APP1 EXIF block in a JPEG stream.
pub fn extract_exif(jpeg: &[u8]) -> Result<Option<Metadata>, CodecError> {
    if !jpeg.starts_with(&SOI) {
        return Err(CodecError::Decode("not a JPEG stream".into()));
    }

    let mut pos = SOI.len();
    while pos + 4 <= jpeg.len() {
        if jpeg[pos] != 0xFF {
            return Err(CodecError::Metadata(format!(
                "expected marker at offset {pos}"
            )));
        }
        let marker = jpeg[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == SOS || marker == EOI {
            break;
        }

        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > jpeg.len() {
            return Err(CodecError::Metadata(format!(
                "truncated segment at offset {pos}"
            )));
        }
        let payload = &jpeg[pos + 4..pos + 2 + len];
        if marker == APP1 && payload.starts_with(EXIF_HEADER) {
            return Metadata::from_payload(Bytes::copy_from_slice(payload)).map(Some);
        }
        pos += 2 + len;
    }
    Ok(None)
}
