use crate::domain::model::ImagePayload;
use crate::utils::error::{PlantError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";
/// Gemini 行內資料上限約 20MB
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Where an image to identify comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Stdin,
    DataUrl(String),
}

impl ImageSource {
    pub fn parse(arg: &str) -> Self {
        let trimmed = arg.trim();
        if trimmed == "-" {
            ImageSource::Stdin
        } else if trimmed.starts_with("data:") {
            ImageSource::DataUrl(trimmed.to_string())
        } else {
            ImageSource::Path(PathBuf::from(arg))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Stdin => "<stdin>".to_string(),
            ImageSource::DataUrl(_) => "<data url>".to_string(),
        }
    }
}

impl ImagePayload {
    /// Accepts `data:image/<type>;base64,<data>` or bare base64.
    pub fn from_data_url(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        let (mime_type, data) = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let (header, data) = rest.split_once(',').ok_or_else(|| PlantError::ImageError {
                    message: "data URL has no ',' separator".to_string(),
                })?;
                let mime = header.strip_suffix(";base64").ok_or_else(|| PlantError::ImageError {
                    message: "only base64 data URLs are supported".to_string(),
                })?;
                if !mime.starts_with("image/") {
                    return Err(PlantError::ImageError {
                        message: format!("data URL is not an image: {}", mime),
                    });
                }
                (mime.to_string(), data)
            }
            None => (DEFAULT_MIME_TYPE.to_string(), trimmed),
        };

        if data.is_empty() {
            return Err(PlantError::ImageError {
                message: "image data is empty".to_string(),
            });
        }

        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(PlantError::ImageError {
                message: "image data is empty".to_string(),
            });
        }

        let mime_type = match infer::get(bytes) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
                kind.mime_type().to_string()
            }
            Some(kind) => {
                return Err(PlantError::ImageError {
                    message: format!("input is {}, not an image", kind.mime_type()),
                })
            }
            None => DEFAULT_MIME_TYPE.to_string(),
        };

        Ok(Self {
            mime_type,
            data: BASE64.encode(bytes),
        })
    }

    /// 解碼後的位元組數
    pub fn decoded_len(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

fn check_size(len: usize, max_bytes: usize) -> Result<()> {
    if len > max_bytes {
        return Err(PlantError::ImageError {
            message: format!("image is {} bytes, limit is {} bytes", len, max_bytes),
        });
    }
    Ok(())
}

/// Reads at most one byte past the limit so oversized input is caught without buffering all of it.
pub async fn read_limited<R: AsyncRead + Unpin>(reader: R, max_bytes: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut bytes)
        .await?;
    check_size(bytes.len(), max_bytes)?;
    Ok(bytes)
}

pub async fn load_image(source: &ImageSource, max_bytes: usize) -> Result<ImagePayload> {
    tracing::debug!("Loading image from {}", source.describe());

    let payload = match source {
        ImageSource::Path(path) => {
            let len = tokio::fs::metadata(path).await?.len();
            check_size(usize::try_from(len).unwrap_or(usize::MAX), max_bytes)?;
            let file = tokio::fs::File::open(path).await?;
            ImagePayload::from_bytes(&read_limited(file, max_bytes).await?)?
        }
        ImageSource::Stdin => {
            let bytes = read_limited(tokio::io::stdin(), max_bytes).await?;
            ImagePayload::from_bytes(&bytes)?
        }
        ImageSource::DataUrl(url) => {
            let payload = ImagePayload::from_data_url(url)?;
            check_size(payload.decoded_len(), max_bytes)?;
            payload
        }
    };

    tracing::debug!(
        "Loaded {} image ({} base64 chars)",
        payload.mime_type,
        payload.data.len()
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PNG_HEADER: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn test_parse_image_source() {
        assert_eq!(ImageSource::parse("-"), ImageSource::Stdin);
        assert_eq!(
            ImageSource::parse("data:image/png;base64,AAAA"),
            ImageSource::DataUrl("data:image/png;base64,AAAA".to_string())
        );
        assert_eq!(
            ImageSource::parse("leaf.jpg"),
            ImageSource::Path(PathBuf::from("leaf.jpg"))
        );
    }

    #[test]
    fn test_data_url_prefix_is_stripped() {
        let payload = ImagePayload::from_data_url("data:image/webp;base64,UklGRg==").unwrap();
        assert_eq!(payload.mime_type, "image/webp");
        assert_eq!(payload.data, "UklGRg==");
    }

    #[test]
    fn test_bare_base64_defaults_to_jpeg() {
        let payload = ImagePayload::from_data_url("/9j/4AAQSkZJRg==").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(payload.data, "/9j/4AAQSkZJRg==");
    }

    #[test]
    fn test_rejects_non_image_data_url() {
        assert!(ImagePayload::from_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(ImagePayload::from_data_url("data:image/png,raw").is_err());
        assert!(ImagePayload::from_data_url("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_from_bytes_sniffs_png() {
        let payload = ImagePayload::from_bytes(&PNG_HEADER).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data, BASE64.encode(PNG_HEADER));
    }

    #[test]
    fn test_from_bytes_rejects_known_non_image() {
        let pdf = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n";
        assert!(ImagePayload::from_bytes(pdf).is_err());
        assert!(ImagePayload::from_bytes(&[]).is_err());
    }

    #[tokio::test]
    async fn test_load_image_from_file_enforces_limit() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&PNG_HEADER).unwrap();
        let source = ImageSource::Path(file.path().to_path_buf());

        let payload = load_image(&source, 1024).await.unwrap();
        assert_eq!(payload.mime_type, "image/png");

        let err = load_image(&source, 8).await.unwrap_err();
        assert!(matches!(err, PlantError::ImageError { .. }));
    }

    #[tokio::test]
    async fn test_read_limited_stops_past_limit() {
        let input: &[u8] = &[0u8; 64];

        let err = read_limited(input, 10).await.unwrap_err();
        match err {
            PlantError::ImageError { message } => {
                assert_eq!(message, "image is 11 bytes, limit is 10 bytes")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let bytes = read_limited(input, 64).await.unwrap();
        assert_eq!(bytes.len(), 64);
    }

    #[tokio::test]
    async fn test_load_image_missing_file() {
        let source = ImageSource::Path(PathBuf::from("/definitely/not/here.jpg"));
        let err = load_image(&source, DEFAULT_MAX_IMAGE_BYTES).await.unwrap_err();
        assert!(matches!(err, PlantError::IoError(_)));
    }
}
