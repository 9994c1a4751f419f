//! Profile photo intake: uploaded bytes become a data URL, capped at 5 MB.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::AppError;

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

fn too_large() -> AppError {
    AppError::PayloadTooLarge("Photo is too large, the limit is 5 MB".to_string())
}

/// Checks size and format and returns `data:<mime>;base64,...`.
pub fn encode_upload(bytes: &[u8]) -> Result<String, AppError> {
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(too_large());
    }
    if bytes.is_empty() {
        return Err(AppError::Validation("Photo is empty".to_string()));
    }

    let format = image::guess_format(bytes)
        .map_err(|_| AppError::Validation("Photo is not a supported image".to_string()))?;

    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

/// Inverse of [`encode_upload`] for photos stored inline.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, AppError> {
    let (header, payload) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| AppError::Validation("Malformed data URL".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(AppError::Validation("Data URL is not base64".to_string()));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(too_large());
    }
    Ok(bytes)
}
