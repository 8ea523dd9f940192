//! Base64 image payloads as sent by the web client.
//!
//! The client posts images as data URIs (`data:image/png;base64,...`).
//! The declared MIME type is not trusted: the format is sniffed from the
//! decoded bytes.

use crate::error::AppError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Decode a data URI or bare base64 string into image bytes.
pub fn decode_image(field: &str, data: &str) -> Result<DecodedImage, AppError> {
    let data = data.trim();
    if data.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    let payload = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| AppError::Validation(format!("{} is not a valid data URI", field)))?;
            if !header.ends_with(";base64") {
                return Err(AppError::Validation(format!(
                    "{} must be base64 encoded",
                    field
                )));
            }
            payload
        }
        None => data,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::Validation(format!("{} is not valid base64: {}", field, e)))?;
    let format = ImageFormat::sniff(&bytes)
        .ok_or_else(|| AppError::Validation(format!("{} is not a supported image", field)))?;
    Ok(DecodedImage { format, bytes })
}
