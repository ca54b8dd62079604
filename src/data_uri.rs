//! `data:image/<format>;base64,<payload>` encoding.

use crate::imaging::ImageKind;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataUriError {
    #[error("not a data URI: expected `data:image/<format>;base64,` prefix")]
    MalformedHeader,
    #[error("unsupported media type image/{0}")]
    UnsupportedMediaType(String),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Wrap encoded image bytes as a data URI. Standard alphabet, padded, unwrapped.
pub fn encode(format: ImageKind, bytes: &[u8]) -> String {
    let prefix = format!("data:{};base64,", format.mime_type());
    let mut uri = String::with_capacity(prefix.len() + bytes.len().div_ceil(3) * 4);
    uri.push_str(&prefix);
    STANDARD.encode_string(bytes, &mut uri);
    uri
}

/// Split a data URI produced by [`encode`] back into format and bytes.
pub fn decode(uri: &str) -> Result<(ImageKind, Vec<u8>), DataUriError> {
    let rest = uri
        .strip_prefix("data:image/")
        .ok_or(DataUriError::MalformedHeader)?;
    let (subtype, payload) = rest
        .split_once(";base64,")
        .ok_or(DataUriError::MalformedHeader)?;
    let kind = ImageKind::from_subtype(subtype)
        .ok_or_else(|| DataUriError::UnsupportedMediaType(subtype.to_string()))?;
    Ok((kind, STANDARD.decode(payload)?))
}
