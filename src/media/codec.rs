//! Decoding of inline image fields.
//!
//! Image fields arrive either as a multipart upload or as a data URI of the
//! form `data:image/<subtype>;base64,<payload>`. Both are turned into a
//! [`ContentFile`] held in memory; writing it out is up to the caller.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use thiserror::Error;

use crate::error::{Error, HtmlError};

const DATA_URI_PREFIX: &str = "data:image";
const BASE64_SEPARATOR: &str = ";base64,";

pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("No file was submitted.")]
    Empty,

    #[error("The submitted data was not a file. Check the encoding type on the form.")]
    NotAFile,

    #[error("The submitted file is not valid base64.")]
    InvalidBase64,

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,
}

impl ImageError {
    /// Field validation error for the field the image was submitted in.
    pub fn into_field_error(self, field: &str) -> Error {
        HtmlError::InvalidRequest.field(field, &self.to_string())
    }
}

pub enum ImagePayload {
    Encoded(String),
    Raw {
        bytes: Vec<u8>,
        filename: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl ContentFile {
    pub fn extension(&self) -> &str {
        self.name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
    }
}

pub fn decode_image(payload: ImagePayload) -> Result<ContentFile, ImageError> {
    let (content, extension) = match payload {
        ImagePayload::Encoded(data) => decode_data_uri(&data)?,
        ImagePayload::Raw { bytes, filename } => {
            if bytes.is_empty() {
                return Err(ImageError::Empty);
            }
            let extension = filename
                .as_deref()
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .filter(|ext| is_safe_extension(ext));
            (bytes, extension)
        }
    };

    let format = image::guess_format(&content).map_err(|_| ImageError::NotAnImage)?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::NotAnImage);
    }

    let extension = match extension {
        Some(extension) => extension,
        None => format
            .extensions_str()
            .first()
            .map(|ext| ext.to_string())
            .ok_or(ImageError::NotAnImage)?,
    };

    Ok(ContentFile {
        name: format!("temp.{extension}"),
        content,
    })
}

/// Splits `data:image/<subtype>;base64,<payload>` into the decoded payload
/// and the subtype used as file extension.
fn decode_data_uri(data: &str) -> Result<(Vec<u8>, Option<String>), ImageError> {
    let data = data.trim();
    if data.is_empty() {
        return Err(ImageError::Empty);
    }
    if !data.starts_with(DATA_URI_PREFIX) {
        return Err(ImageError::NotAFile);
    }

    let (header, encoded) = data
        .split_once(BASE64_SEPARATOR)
        .ok_or(ImageError::NotAFile)?;
    let extension = header
        .rsplit('/')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| is_safe_extension(ext));

    let content = STANDARD
        .decode(encoded)
        .map_err(|_| ImageError::InvalidBase64)?;
    if content.is_empty() {
        return Err(ImageError::Empty);
    }

    Ok((content, extension))
}

fn is_safe_extension(extension: &str) -> bool {
    !extension.is_empty()
        && extension.len() <= 10
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
}
