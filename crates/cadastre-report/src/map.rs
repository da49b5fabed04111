//! Map snapshot handling
//!
//! The map itself is drawn by an external collaborator; the report only
//! receives a raster snapshot of it. Capture is best effort: any failure
//! means the report is produced without a map.

use crate::error::ReportError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use std::path::PathBuf;

/// An 8-bit RGB raster.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshot {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl MapSnapshot {
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, ReportError> {
        if width == 0 || height == 0 {
            return Err(ReportError::MapImage(format!(
                "Empty image ({}x{})",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(ReportError::MapImage(format!(
                "Expected {} RGB bytes for {}x{}, got {}",
                expected,
                width,
                height,
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }

    /// Decode a PNG, flattening any alpha channel onto white.
    pub fn from_png(bytes: &[u8]) -> Result<Self, ReportError> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder
            .read_info()
            .map_err(|e| ReportError::MapImage(format!("Invalid PNG: {}", e)))?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| ReportError::MapImage(format!("Failed to decode PNG: {}", e)))?;
        let pixels = &buf[..info.buffer_size()];

        let rgb = match info.color_type {
            png::ColorType::Rgb => pixels.to_vec(),
            png::ColorType::Rgba => pixels
                .chunks_exact(4)
                .flat_map(|px| {
                    let alpha = px[3];
                    [
                        over_white(px[0], alpha),
                        over_white(px[1], alpha),
                        over_white(px[2], alpha),
                    ]
                })
                .collect(),
            png::ColorType::Grayscale => pixels.iter().flat_map(|&g| [g, g, g]).collect(),
            png::ColorType::GrayscaleAlpha => pixels
                .chunks_exact(2)
                .flat_map(|px| {
                    let g = over_white(px[0], px[1]);
                    [g, g, g]
                })
                .collect(),
            other => {
                return Err(ReportError::MapImage(format!(
                    "Unsupported PNG color type: {:?}",
                    other
                )))
            }
        };

        Self::from_rgb(info.width, info.height, rgb)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Height over width.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }

    /// Zlib-compressed pixel data, ready for a FlateDecode image stream.
    pub fn compressed(&self) -> Result<Vec<u8>, ReportError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.rgb)?;
        Ok(encoder.finish()?)
    }
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = u16::from(channel);
    let a = u16::from(alpha);
    ((c * a + 255 * (255 - a)) / 255) as u8
}

/// Something that can produce a map snapshot.
pub trait MapCapture {
    fn capture(&self) -> Result<MapSnapshot, ReportError>;
}

/// A PNG already held in memory.
#[derive(Debug, Clone)]
pub struct PngBytes(pub Vec<u8>);

impl MapCapture for PngBytes {
    fn capture(&self) -> Result<MapSnapshot, ReportError> {
        MapSnapshot::from_png(&self.0)
    }
}

/// A PNG on disk.
#[derive(Debug, Clone)]
pub struct PngFile(pub PathBuf);

impl MapCapture for PngFile {
    fn capture(&self) -> Result<MapSnapshot, ReportError> {
        let bytes = std::fs::read(&self.0).map_err(|e| {
            ReportError::MapImage(format!("Failed to read {}: {}", self.0.display(), e))
        })?;
        MapSnapshot::from_png(&bytes)
    }
}

/// Run a capture to completion, turning failure into "no map".
pub fn resolve_map(capture: Option<&dyn MapCapture>) -> Option<MapSnapshot> {
    let capture = capture?;
    match capture.capture() {
        Ok(snapshot) => {
            tracing::debug!(
                width = snapshot.width(),
                height = snapshot.height(),
                "Captured map snapshot"
            );
            Some(snapshot)
        }
        Err(e) => {
            tracing::warn!("Map capture failed, report will not include a map: {}", e);
            None
        }
    }
}
