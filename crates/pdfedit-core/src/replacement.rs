//! Replacement image decoding and image XObject overwriting

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use image::ImageFormat;
use lopdf::{Object, Stream};
use tracing::debug;

use crate::error::EditError;

/// Entries that describe the old payload and would contradict the new one
const STALE_IMAGE_KEYS: &[&[u8]] = &[
    b"DecodeParms",
    b"Decode",
    b"SMask",
    b"SMaskInData",
    b"Mask",
    b"ImageMask",
];

/// A decoded PNG or JPEG, already re-encoded as a Flate-compressed 8-bit
/// DeviceRGB sample stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ReplacementImage {
    /// Decode uploaded image bytes. Anything other than PNG or JPEG fails.
    pub fn decode(bytes: &[u8]) -> Result<Self, EditError> {
        let format =
            image::guess_format(bytes).map_err(|e| EditError::ImageDecode(e.to_string()))?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(EditError::ImageDecode(format!(
                "Unsupported image format {:?}, expected PNG or JPEG",
                format
            )));
        }

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| EditError::ImageDecode(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(rgb.as_raw())
            .map_err(|e| EditError::ImageDecode(format!("Failed to compress samples: {}", e)))?;
        let data = encoder
            .finish()
            .map_err(|e| EditError::ImageDecode(format!("Failed to finish compression: {}", e)))?;

        debug!(
            "Decoded replacement image {:?} {}x{} ({} bytes encoded)",
            format,
            width,
            height,
            data.len()
        );

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The Flate-compressed RGB samples written into the XObject
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// Replace an image XObject's payload and metadata with this image
    pub fn overwrite(&self, stream: &mut Stream) {
        for key in STALE_IMAGE_KEYS {
            stream.dict.remove(key);
        }

        stream.dict.set("Type", Object::Name(b"XObject".to_vec()));
        stream.dict.set("Subtype", Object::Name(b"Image".to_vec()));
        stream.dict.set("Width", Object::Integer(self.width as i64));
        stream.dict.set("Height", Object::Integer(self.height as i64));
        stream
            .dict
            .set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        stream.dict.set("BitsPerComponent", Object::Integer(8));
        stream.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        stream
            .dict
            .set("Length", Object::Integer(self.data.len() as i64));
        stream.content = self.data.clone();
    }
}
