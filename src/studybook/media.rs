//! Inline image embedding.
//!
//! Images are stored inside records as `data:<mime>;base64,<payload>` strings. Nothing
//! here resizes or re-encodes; the bytes are embedded as given.

use crate::error::{Result, StudyError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Guesses an image MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}

/// Reads an image file into a data URL.
pub fn load_image(path: &Path) -> Result<String> {
    let mime = mime_for_path(path).ok_or_else(|| {
        StudyError::Validation(format!("Not a supported image: {}", path.display()))
    })?;
    let bytes = std::fs::read(path)?;
    Ok(to_data_url(mime, &bytes))
}

/// Splits a data URL into its MIME type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let invalid = || StudyError::Validation("Malformed data URL".to_string());
    let rest = url.strip_prefix("data:").ok_or_else(invalid)?;
    let (mime, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;
    let bytes = STANDARD.decode(payload).map_err(|_| invalid())?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn encodes_bytes_with_mime() {
        assert_eq!(to_data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
        let (mime, bytes) = decode_data_url("data:image/png;base64,aGk=").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn mime_by_extension() {
        assert_eq!(mime_for_path(&PathBuf::from("a/B.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(&PathBuf::from("scan.webp")), Some("image/webp"));
        assert_eq!(mime_for_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(mime_for_path(&PathBuf::from("README")), None);
    }

    #[test]
    fn load_rejects_unknown_types() {
        let temp = tempfile::tempdir().unwrap();
        let txt = temp.path().join("a.txt");
        std::fs::write(&txt, "x").unwrap();
        assert!(matches!(load_image(&txt), Err(StudyError::Validation(_))));

        let png = temp.path().join("a.png");
        std::fs::write(&png, [0x89u8, b'P']).unwrap();
        assert!(load_image(&png).unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(decode_data_url("image/png;base64,aGk=").is_err());
        assert!(decode_data_url("data:image/png,aGk=").is_err());
        assert!(decode_data_url("data:image/png;base64,***").is_err());
    }
}
