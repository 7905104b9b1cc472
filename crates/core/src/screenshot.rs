//! Screenshot change signalling and data-URL helpers.

use std::{fs, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

/// Errors raised while turning files into data URLs and back.
#[derive(Debug, Error)]
pub enum ScreenshotError {
    /// The file extension is not a known image type.
    #[error("not an image file: {0}")]
    NotAnImage(String),
    /// The string is not a `data:<mime>;base64,` URL.
    #[error("malformed data URL")]
    Malformed,
    /// The base64 payload failed to decode.
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
    /// Reading the source file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// What should happen to a game's stored screenshot on save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScreenshotChange {
    /// Keep whatever is stored (wire `null`).
    #[default]
    Unchanged,
    /// Delete the stored image (wire `""`).
    Remove,
    /// Store this data URL instead.
    Replace(String),
}

impl ScreenshotChange {
    /// Wire value for an update call.
    pub fn for_update(&self) -> Option<String> {
        match self {
            ScreenshotChange::Unchanged => None,
            ScreenshotChange::Remove => Some(String::new()),
            ScreenshotChange::Replace(data) => Some(data.clone()),
        }
    }

    /// Wire value for a create call; there is nothing to keep or remove.
    pub fn for_create(&self) -> Option<String> {
        match self {
            ScreenshotChange::Replace(data) if !data.is_empty() => Some(data.clone()),
            _ => None,
        }
    }

    /// Rebuild the change from a wire value.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            None => ScreenshotChange::Unchanged,
            Some("") => ScreenshotChange::Remove,
            Some(data) => ScreenshotChange::Replace(data.to_string()),
        }
    }
}

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// MIME type, e.g. `image/png`.
    pub mime: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Read an image file and wrap it in a data URL.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScreenshotError> {
        let path = path.as_ref();
        let mime = mime_for_path(path)
            .ok_or_else(|| ScreenshotError::NotAnImage(path.display().to_string()))?;
        let bytes = fs::read(path).map_err(|source| ScreenshotError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    /// Parse a data URL. A bare base64 payload without the `data:` header is
    /// accepted and treated as `application/octet-stream`.
    pub fn parse(value: &str) -> Result<Self, ScreenshotError> {
        let value = value.trim();
        let (mime, payload) = match value.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or(ScreenshotError::Malformed)?;
                let mime = header
                    .strip_suffix(";base64")
                    .ok_or(ScreenshotError::Malformed)?;
                (mime.to_string(), payload)
            }
            None => ("application/octet-stream".to_string(), value),
        };
        let bytes = STANDARD.decode(payload)?;
        Ok(Self { mime, bytes })
    }

    /// Encode back into `data:<mime>;base64,<payload>`.
    pub fn encode(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// File extension matching the MIME type (without the dot).
    pub fn extension(&self) -> &'static str {
        if self.is_svg() {
            return "svg";
        }
        match self.mime.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            _ => "webp",
        }
    }

    /// Whether the payload is an SVG document, judged by MIME or content.
    pub fn is_svg(&self) -> bool {
        if self.mime == "image/svg+xml" {
            return true;
        }
        let head = &self.bytes[..self.bytes.len().min(100)];
        self.bytes.starts_with(b"<?xml") || head.windows(4).any(|window| window == b"<svg")
    }

    /// Size of the decoded image in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the decoded image is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type for an image file, judged by extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

/// MIME type for a stored screenshot file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/webp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn tri_state_wire_values() {
        assert_eq!(ScreenshotChange::Unchanged.for_update(), None);
        assert_eq!(ScreenshotChange::Remove.for_update(), Some(String::new()));
        let data = "data:image/png;base64,AAAA".to_string();
        assert_eq!(
            ScreenshotChange::Replace(data.clone()).for_update(),
            Some(data.clone())
        );

        assert_eq!(ScreenshotChange::Unchanged.for_create(), None);
        assert_eq!(ScreenshotChange::Remove.for_create(), None);
        assert_eq!(ScreenshotChange::Replace(data.clone()).for_create(), Some(data));
    }

    #[test]
    fn wire_values_map_back() {
        assert_eq!(ScreenshotChange::from_wire(None), ScreenshotChange::Unchanged);
        assert_eq!(ScreenshotChange::from_wire(Some("")), ScreenshotChange::Remove);
        assert_eq!(
            ScreenshotChange::from_wire(Some("data:x")),
            ScreenshotChange::Replace("data:x".into())
        );
    }

    #[test]
    fn reads_image_files() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("shot.PNG");
        fs::write(&path, [0x89, b'P', b'N', b'G'])?;

        let url = DataUrl::from_file(&path)?;
        assert_eq!(url.mime, "image/png");
        assert_eq!(url.encode(), "data:image/png;base64,iVBORw==");
        assert_eq!(url.extension(), "png");

        let text = dir.path().join("notes.txt");
        fs::write(&text, "hello")?;
        assert!(matches!(
            DataUrl::from_file(&text),
            Err(ScreenshotError::NotAnImage(_))
        ));
        Ok(())
    }

    #[test]
    fn parses_data_urls() -> Result<()> {
        let parsed = DataUrl::parse("data:image/jpeg;base64,aGVsbG8=")?;
        assert_eq!(parsed.mime, "image/jpeg");
        assert_eq!(parsed.bytes, b"hello");
        assert_eq!(parsed.extension(), "jpg");

        let bare = DataUrl::parse("aGVsbG8=")?;
        assert_eq!(bare.bytes, b"hello");

        assert!(matches!(
            DataUrl::parse("data:image/png,plain"),
            Err(ScreenshotError::Malformed)
        ));
        Ok(())
    }

    #[test]
    fn detects_svg_content() {
        let url = DataUrl {
            mime: "application/octet-stream".into(),
            bytes: b"<svg xmlns='http://www.w3.org/2000/svg'/>".to_vec(),
        };
        assert!(url.is_svg());
        assert_eq!(url.extension(), "svg");
    }
}
