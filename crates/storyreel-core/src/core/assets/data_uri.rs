//! `data:` URI encoding and decoding.

use base64::Engine as _;

/// Decoded `data:` URI payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn is_data_uri(source: &str) -> bool {
    source.starts_with("data:")
}

/// Encodes bytes as a base64 `data:` URI.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Splits a base64 `data:` URI into its mime type and the raw base64 text.
pub fn split(source: &str) -> Result<(&str, &str), String> {
    let rest = source
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URI has no payload separator".to_string())?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| "only base64 data URIs are supported".to_string())?;
    if mime_type.is_empty() {
        return Err("data URI has no mime type".to_string());
    }
    Ok((mime_type, payload))
}

/// Decodes a base64 `data:` URI.
pub fn decode(source: &str) -> Result<DataUri, String> {
    let (mime_type, payload) = split(source)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 payload: {e}"))?;
    Ok(DataUri {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Guesses an image mime type from a file extension.
pub fn image_mime_for_path(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let uri = encode("image/png", &[1, 2, 3, 250]);
        assert!(uri.starts_with("data:image/png;base64,"));
        let decoded = decode(&uri).unwrap();
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.bytes, vec![1, 2, 3, 250]);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode("https://example.com/a.png").is_err());
        assert!(decode("data:image/png,raw").is_err());
        assert!(decode("data:;base64,AA==").is_err());
        assert!(decode("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_image_mime_for_path() {
        assert_eq!(image_mime_for_path("a/B.JPG"), "image/jpeg");
        assert_eq!(image_mime_for_path("x.webp"), "image/webp");
        assert_eq!(image_mime_for_path("x.bin"), "image/png");
    }
}
