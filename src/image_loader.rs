//! # Images
//!
//! Prepares rasters for embedding: letterhead logos read from disk and the
//! audiogram PNGs produced by [`crate::chart`]. JPEG data is passed through
//! untouched (the PDF viewer decodes it), so only its frame header is read.
//! PNG is decoded with `image` and split into an RGB plane and, when any
//! pixel is translucent, an alpha plane for the soft mask.

use std::path::Path;

use tracing::debug;

use crate::error::ReportError;

/// An image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Width over height; 1.0 for degenerate images.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height_px == 0 {
            1.0
        } else {
            self.width_px as f64 / self.height_px as f64
        }
    }

    /// Largest `(width, height)` with this aspect ratio inside the box.
    pub fn fit_within(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let ratio = self.aspect_ratio();
        let width = (max_height * ratio).min(max_width);
        (width, width / ratio)
    }
}

#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Original JPEG stream, embedded with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Interleaved RGB, plus one alpha byte per pixel when not opaque.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Jpeg,
    Png,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn sniff(data: &[u8]) -> Option<SourceFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(SourceFormat::Jpeg)
    } else if data.starts_with(&PNG_SIGNATURE) {
        Some(SourceFormat::Png)
    } else {
        None
    }
}

/// Read and decode an image file.
pub fn load_image_file(path: &Path) -> Result<LoadedImage, ReportError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ReportError::Image(format!("cannot read '{}': {}", path.display(), e)))?;
    let image = decode_image_bytes(&bytes)?;
    debug!(path = %path.display(), width = image.width_px, height = image.height_px, "image loaded");
    Ok(image)
}

/// Decode PNG or JPEG bytes.
pub fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, ReportError> {
    match sniff(data) {
        Some(SourceFormat::Jpeg) => load_jpeg(data),
        Some(SourceFormat::Png) => load_png(data),
        None => Err(ReportError::Image(
            "unsupported image format (expected PNG or JPEG)".to_string(),
        )),
    }
}

/// Size and component count from the JPEG start-of-frame segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameHeader {
    width: u32,
    height: u32,
    components: u8,
}

fn read_frame_header(data: &[u8]) -> Option<FrameHeader> {
    let mut i = 2;
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        // Fill bytes before a marker.
        if marker == 0xFF {
            i += 1;
            continue;
        }
        // Markers without a length field.
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }
        let length = u16::from_be_bytes([*data.get(i + 2)?, *data.get(i + 3)?]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_frame {
            let segment = data.get(i + 4..i + 10)?;
            return Some(FrameHeader {
                height: u16::from_be_bytes([segment[1], segment[2]]) as u32,
                width: u16::from_be_bytes([segment[3], segment[4]]) as u32,
                components: segment[5],
            });
        }
        i += 2 + length;
    }
    None
}

fn load_jpeg(data: &[u8]) -> Result<LoadedImage, ReportError> {
    let frame = read_frame_header(data)
        .ok_or_else(|| ReportError::Image("JPEG has no readable frame header".to_string()))?;
    if frame.width == 0 || frame.height == 0 {
        return Err(ReportError::Image("JPEG has zero size".to_string()));
    }
    let color_space = match frame.components {
        1 => JpegColorSpace::DeviceGray,
        3 => JpegColorSpace::DeviceRGB,
        n => {
            return Err(ReportError::Image(format!(
                "JPEG with {} components is not supported",
                n
            )))
        }
    };
    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space,
        },
        width_px: frame.width,
        height_px: frame.height,
    })
}

fn load_png(data: &[u8]) -> Result<LoadedImage, ReportError> {
    let rgba = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| ReportError::Image(format!("cannot decode PNG: {}", e)))?
        .into_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(rgba.len() / 4);
    for px in rgba.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
        alpha.push(px.0[3]);
    }
    let opaque = alpha.iter().all(|&a| a == u8::MAX);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: (!opaque).then_some(alpha),
        },
        width_px,
        height_px,
    })
}
