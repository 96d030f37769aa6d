use std::{io::Cursor, sync::Arc};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::{
    encode::data_uri,
    foundation::error::{StorysheetError, StorysheetResult},
    model::items::Role,
    render::{blend::unpremultiply_in_place, surface::Raster},
};

/// Media type of every composite.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Encoded image bytes plus their media type.
///
/// Cloning shares the byte buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Media type of `bytes`.
    pub media_type: String,
    /// Encoded bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl EncodedImage {
    /// Encode a premultiplied raster as a straight-alpha PNG.
    pub fn png_from_raster(raster: &Raster) -> StorysheetResult<Self> {
        let mut straight = raster.data.clone();
        unpremultiply_in_place(&mut straight);
        let img = image::RgbaImage::from_raw(raster.width, raster.height, straight)
            .ok_or_else(|| StorysheetError::encoding("raster byte length mismatch"))?;

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| StorysheetError::encoding(format!("png encode failed: {e}")))?;
        Ok(Self {
            media_type: PNG_MEDIA_TYPE.to_string(),
            bytes: Arc::new(buf),
        })
    }

    /// Self-describing `data:<media-type>;base64,<payload>` form.
    pub fn data_uri(&self) -> String {
        data_uri::to_data_uri(&self.media_type, &self.bytes)
    }

    /// Bare base64 payload, as forwarded to the generation service.
    pub fn base64_payload(&self) -> String {
        STANDARD.encode(self.bytes.as_slice())
    }

    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One compositor's output: the encoded sheet plus its role and pixel size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composite {
    /// Which reference this sheet is.
    pub role: Role,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// PNG encoding.
    pub image: EncodedImage,
}

impl Composite {
    /// Encode a finished raster for `role`.
    pub fn from_raster(role: Role, raster: &Raster) -> StorysheetResult<Self> {
        let image = EncodedImage::png_from_raster(raster)?;
        Ok(Self {
            role,
            width: raster.width,
            height: raster.height,
            image,
        })
    }

    /// Data URI of the encoded sheet.
    pub fn data_uri(&self) -> String {
        self.image.data_uri()
    }

    /// Decode back to straight-alpha RGBA8.
    pub fn decode(&self) -> StorysheetResult<image::RgbaImage> {
        let img = image::load_from_memory(self.image.as_bytes())
            .map_err(|e| StorysheetError::encoding(format!("png decode failed: {e}")))?;
        Ok(img.to_rgba8())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
