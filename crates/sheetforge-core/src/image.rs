//! Image probing, sizing and placement
//!
//! Only the file header is inspected: pixel dimensions and, where the format
//! records one, physical resolution. Images without density metadata are
//! treated as 96 DPI.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use log::trace;

use crate::error::{Error, Result};

/// English Metric Units per inch
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Resolution assumed when an image carries none
pub const DEFAULT_DPI: f64 = 96.0;

const METRES_PER_INCH: f64 = 0.0254;

/// Image container formats that can be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// File extension used for the media part
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// MIME type of the media part
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// Format for a media part extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }
}

/// Physical resolution in dots per inch; axes may differ
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for Resolution {
    fn default() -> Self {
        Self::uniform(DEFAULT_DPI)
    }
}

impl Resolution {
    /// Same resolution on both axes
    pub fn uniform(dpi: f64) -> Self {
        Self {
            horizontal: dpi,
            vertical: dpi,
        }
    }

    /// Build from dots-per-metre values; zeros fall back to the default
    fn from_dots_per_metre(x: f64, y: f64) -> Self {
        if x <= 0.0 || y <= 0.0 {
            return Self::default();
        }
        Self {
            horizontal: x * METRES_PER_INCH,
            vertical: y * METRES_PER_INCH,
        }
    }
}

/// Header information of an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    pub resolution: Resolution,
}

/// Header-only image inspection
pub struct ImageProbe;

impl ImageProbe {
    /// Detect format, pixel size and resolution
    pub fn probe(bytes: &[u8]) -> Result<ImageInfo> {
        let info = if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            probe_png(bytes)
        } else if bytes.starts_with(&[0xFF, 0xD8]) {
            probe_jpeg(bytes)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            probe_gif(bytes)
        } else if bytes.starts_with(b"BM") {
            probe_bmp(bytes)
        } else {
            None
        };

        info.ok_or_else(|| {
            Error::UnsupportedImage(format!(
                "unrecognized header ({} bytes)",
                bytes.len()
            ))
        })
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn le_i32(bytes: &[u8], at: usize) -> Option<i32> {
    Some(i32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn probe_png(bytes: &[u8]) -> Option<ImageInfo> {
    if bytes.get(12..16)? != b"IHDR" {
        return None;
    }
    let width_px = be_u32(bytes, 16)?;
    let height_px = be_u32(bytes, 20)?;

    // Walk the chunks after IHDR looking for pHYs, which must precede IDAT
    let mut resolution = Resolution::default();
    let mut pos = 8;
    while let (Some(len), Some(kind)) = (be_u32(bytes, pos), bytes.get(pos + 4..pos + 8)) {
        match kind {
            b"pHYs" => {
                let x = be_u32(bytes, pos + 8)?;
                let y = be_u32(bytes, pos + 12)?;
                // Unit 1 is the metre; 0 only states the aspect ratio
                if *bytes.get(pos + 16)? == 1 {
                    resolution = Resolution::from_dots_per_metre(x as f64, y as f64);
                }
                break;
            }
            b"IDAT" | b"IEND" => break,
            _ => pos = pos.checked_add(12 + len as usize)?,
        }
    }

    Some(ImageInfo {
        format: ImageFormat::Png,
        width_px,
        height_px,
        resolution,
    })
}

fn probe_jpeg(bytes: &[u8]) -> Option<ImageInfo> {
    let mut resolution = Resolution::default();
    let mut pos = 2;

    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(pos + 1)?;
        // Fill bytes and standalone markers carry no length
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        let len = be_u16(bytes, pos + 2)? as usize;
        let segment = pos + 4;

        match marker {
            0xE0 if bytes.get(segment..segment + 5) == Some(b"JFIF\0".as_slice()) => {
                let units = *bytes.get(segment + 7)?;
                let x = be_u16(bytes, segment + 8)? as f64;
                let y = be_u16(bytes, segment + 10)? as f64;
                if x > 0.0 && y > 0.0 {
                    match units {
                        1 => resolution = Resolution { horizontal: x, vertical: y },
                        2 => {
                            resolution = Resolution {
                                horizontal: x * 2.54,
                                vertical: y * 2.54,
                            }
                        }
                        _ => {}
                    }
                }
            }
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height_px = be_u16(bytes, segment + 1)? as u32;
                let width_px = be_u16(bytes, segment + 3)? as u32;
                return Some(ImageInfo {
                    format: ImageFormat::Jpeg,
                    width_px,
                    height_px,
                    resolution,
                });
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        pos = segment.checked_add(len.checked_sub(2)?)?;
    }
}

fn probe_gif(bytes: &[u8]) -> Option<ImageInfo> {
    Some(ImageInfo {
        format: ImageFormat::Gif,
        width_px: le_u16(bytes, 6)? as u32,
        height_px: le_u16(bytes, 8)? as u32,
        resolution: Resolution::default(),
    })
}

fn probe_bmp(bytes: &[u8]) -> Option<ImageInfo> {
    let header_size = le_u32(bytes, 14)?;
    if header_size == 12 {
        return Some(ImageInfo {
            format: ImageFormat::Bmp,
            width_px: le_u16(bytes, 18)? as u32,
            height_px: le_u16(bytes, 20)? as u32,
            resolution: Resolution::default(),
        });
    }
    if header_size < 40 {
        return None;
    }

    Some(ImageInfo {
        format: ImageFormat::Bmp,
        width_px: le_i32(bytes, 18)?.unsigned_abs(),
        // Negative height marks a top-down bitmap
        height_px: le_i32(bytes, 22)?.unsigned_abs(),
        resolution: Resolution::from_dots_per_metre(
            le_i32(bytes, 38)? as f64,
            le_i32(bytes, 42)? as f64,
        ),
    })
}

/// Placed size of an image, in pixels and EMU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub width_px: u32,
    pub height_px: u32,
    pub cx: i64,
    pub cy: i64,
}

/// EMU covered by one pixel at the given resolution (truncated)
pub fn emu_per_pixel(dpi: f64) -> i64 {
    let dpi = if dpi.is_finite() && dpi > 0.0 {
        dpi
    } else {
        DEFAULT_DPI
    };
    (EMU_PER_INCH / dpi) as i64
}

/// Size an image, optionally rescaled to a fixed width with the aspect ratio kept
pub fn compute_extent(
    width_px: u32,
    height_px: u32,
    resolution: Resolution,
    custom_width_px: Option<u32>,
) -> Extent {
    let (width_px, height_px) = match custom_width_px {
        Some(custom) if width_px > 0 => {
            let scaled = height_px as u64 * custom as u64 / width_px as u64;
            (custom, u32::try_from(scaled).unwrap_or(u32::MAX))
        }
        _ => (width_px, height_px),
    };

    Extent {
        width_px,
        height_px,
        cx: width_px as i64 * emu_per_pixel(resolution.horizontal),
        cy: height_px as i64 * emu_per_pixel(resolution.vertical),
    }
}

/// An image anchored at the top-left corner of a cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImagePlacement {
    /// Drawing object id, unique within the sheet
    pub id: u32,
    /// Target column (1-based)
    pub column: u32,
    /// Target row (1-based)
    pub row: u32,
    pub extent: Extent,
    pub format: ImageFormat,
    /// Where the image came from, kept as the picture description
    pub description: String,
    pub data: Vec<u8>,
}

impl ImagePlacement {
    /// Zero-based anchor column
    pub fn anchor_column(&self) -> u32 {
        self.column.saturating_sub(1)
    }

    /// Zero-based anchor row
    pub fn anchor_row(&self) -> u32 {
        self.row.saturating_sub(1)
    }
}

/// Allocates placements with monotonically increasing ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageAnchor {
    last_id: u32,
}

impl ImageAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next placement will receive
    pub fn next_id(&self) -> u32 {
        self.last_id + 1
    }

    /// Account for a placement created elsewhere (e.g. loaded from a document)
    pub fn observe(&mut self, id: u32) {
        self.last_id = self.last_id.max(id);
    }

    /// Probe `data` and place it at `(column, row)`
    pub fn place(
        &mut self,
        column: u32,
        row: u32,
        data: Vec<u8>,
        description: impl Into<String>,
        custom_width_px: Option<u32>,
    ) -> Result<ImagePlacement> {
        if column < 1 || row < 1 {
            return Err(Error::AddressOutOfRange { column, row });
        }
        let info = ImageProbe::probe(&data)?;
        let extent = compute_extent(
            info.width_px,
            info.height_px,
            info.resolution,
            custom_width_px,
        );

        self.last_id += 1;
        trace!(
            "placed image {} at column {}, row {} ({}x{} px)",
            self.last_id,
            column,
            row,
            extent.width_px,
            extent.height_px
        );

        Ok(ImagePlacement {
            id: self.last_id,
            column,
            row,
            extent,
            format: info.format,
            description: description.into(),
            data,
        })
    }
}

/// Where image bytes come from
pub trait ImageSource {
    /// Load the bytes behind an image path or key
    ///
    /// A source that does not exist is reported as
    /// [`Error::MissingImageSource`].
    fn load(&self, source: &str) -> Result<Vec<u8>>;
}

/// Reads images from the file system, optionally relative to a base directory
#[derive(Debug, Clone, Default)]
pub struct FsImageSource {
    base: Option<PathBuf>,
}

impl FsImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base`
    pub fn with_base<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        match &self.base {
            Some(base) if Path::new(source).is_relative() => base.join(source),
            _ => PathBuf::from(source),
        }
    }
}

impl ImageSource for FsImageSource {
    fn load(&self, source: &str) -> Result<Vec<u8>> {
        let path = self.resolve(source);
        let mut file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::MissingImageSource(path.display().to_string()),
            _ => Error::Io(e),
        })?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Serves images from memory, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: AHashMap<String, Vec<u8>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under a key
    pub fn insert<S: Into<String>>(&mut self, key: S, data: Vec<u8>) -> &mut Self {
        self.images.insert(key.into(), data);
        self
    }

    /// Register bytes under a key (builder form)
    pub fn with<S: Into<String>>(mut self, key: S, data: Vec<u8>) -> Self {
        self.insert(key, data);
        self
    }
}

impl ImageSource for MemoryImageSource {
    fn load(&self, source: &str) -> Result<Vec<u8>> {
        self.images
            .get(source)
            .cloned()
            .ok_or_else(|| Error::MissingImageSource(source.to_string()))
    }
}
