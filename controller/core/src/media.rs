//! Upload Media
//!
//! Files staged on the gateway, and the fixed-aspect center crop applied to
//! photos before they are sent to the frame.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A file ready to be sent as a multipart `file` field
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name reported to the gateway
    pub file_name: String,
    /// MIME type guessed from the extension
    pub mime: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    /// Wrap in-memory bytes
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read a file from disk
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Io`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| GatewayError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    /// Whether there is anything to upload
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Guess a MIME type from a file name
#[must_use]
pub fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Width-to-height ratio, e.g. `5:3` for an 800x480 panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    /// Width term
    pub width: u32,
    /// Height term
    pub height: u32,
}

impl AspectRatio {
    /// Create a ratio; both terms must be non-zero
    #[must_use]
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    /// Accepts `W:H` or `WxH`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once([':', 'x'])
            .ok_or_else(|| format!("invalid aspect ratio '{s}' (expected W:H)"))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid aspect width '{w}'"))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid aspect height '{h}'"))?;
        Self::new(width, height).ok_or_else(|| format!("aspect ratio terms must be positive: '{s}'"))
    }
}

/// Center-crop an image to the given aspect ratio
///
/// JPEG input stays JPEG; anything else is re-encoded as PNG and the file
/// name extension follows.
///
/// # Errors
///
/// Returns [`GatewayError::Image`] if the bytes are not a decodable image.
pub fn crop_to_aspect(file: &UploadFile, aspect: AspectRatio) -> Result<UploadFile, GatewayError> {
    let source_format = image::guess_format(&file.bytes)?;
    let img = image::load_from_memory(&file.bytes)?;

    let (x, y, w, h) = crop_window(img.width(), img.height(), aspect);
    let cropped = img.crop_imm(x, y, w, h);

    tracing::debug!(
        from = %format!("{}x{}", img.width(), img.height()),
        to = %format!("{w}x{h}"),
        aspect = %aspect,
        "Cropped upload"
    );

    let (format, file_name) = if source_format == ImageFormat::Jpeg {
        (ImageFormat::Jpeg, file.file_name.clone())
    } else {
        (ImageFormat::Png, with_extension(&file.file_name, "png"))
    };

    let encodable = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(cropped.to_rgb8()),
        _ => cropped,
    };

    let mut out = Cursor::new(Vec::new());
    encodable.write_to(&mut out, format)?;

    Ok(UploadFile::new(file_name, out.into_inner()))
}

/// Largest centered window of `width x height` with the given aspect
fn crop_window(width: u32, height: u32, aspect: AspectRatio) -> (u32, u32, u32, u32) {
    let (w, h) = (u64::from(width), u64::from(height));
    let (rw, rh) = (u64::from(aspect.width), u64::from(aspect.height));

    if w * rh > h * rw {
        // too wide
        let new_w = (h * rw / rh).max(1);
        let x = (w - new_w) / 2;
        (x as u32, 0, new_w as u32, height)
    } else {
        let new_h = (w * rh / rw).max(1);
        let y = (h - new_h) / 2;
        (0, y as u32, width, new_h as u32)
    }
}

fn with_extension(file_name: &str, ext: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.{ext}"),
        _ => format!("{file_name}.{ext}"),
    }
}
