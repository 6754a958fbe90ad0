//! QR code rendering in the four downloadable formats.
//!
//! Every format shares one symbol matrix computed by the `qrcode` crate;
//! only the final serialization differs.

mod eps;
mod pdf;

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::{ImageFormat, Luma};
use qrcode::render::{Pixel, Renderer, svg};
use qrcode::{Color, QrCode};
use thiserror::Error;

/// Module size multiplier used when nothing else is configured.
pub const DEFAULT_SCALE: u32 = 10;

/// Quiet-zone width in modules used when nothing else is configured.
pub const DEFAULT_BORDER: u32 = 4;

/// Largest accepted module size; keeps image dimensions well inside `u32`.
pub const MAX_SCALE: u32 = 100;

/// Largest accepted quiet zone, in modules.
pub const MAX_BORDER: u32 = 64;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("unsupported format '{0}'")]
    UnsupportedFormat(String),

    #[error("payload cannot be encoded: {0}")]
    Encode(String),

    #[error("image encoding failed: {0}")]
    Image(String),

    #[error("document encoding failed: {0}")]
    Document(String),
}

/// Output kinds offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QrFormat {
    Png,
    Svg,
    Eps,
    Pdf,
}

impl QrFormat {
    pub const ALL: [Self; 4] = [Self::Png, Self::Svg, Self::Eps, Self::Pdf];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Eps => "application/postscript",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for QrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for QrFormat {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension() == s)
            .ok_or_else(|| QrError::UnsupportedFormat(s.to_string()))
    }
}

/// Size parameters shared by every output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixels (or points) per module.
    pub scale: u32,
    /// Quiet zone around the symbol, in modules.
    pub border: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            border: DEFAULT_BORDER,
        }
    }
}

/// Encodes `payload` and serializes it as `format`.
pub fn render(
    payload: &str,
    format: QrFormat,
    options: &RenderOptions,
) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;
    let colors = code.to_colors();
    let modules = code.width();

    match format {
        QrFormat::Png => {
            let image = draw::<Luma<u8>>(&colors, modules, options);
            let mut bytes = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .map_err(|e| QrError::Image(e.to_string()))?;
            Ok(bytes)
        }
        QrFormat::Svg => Ok(draw::<svg::Color>(&colors, modules, options).into_bytes()),
        QrFormat::Eps => Ok(draw::<eps::Gray>(&colors, modules, options).into_bytes()),
        QrFormat::Pdf => draw::<pdf::Gray>(&colors, modules, options)
            .into_document()
            .map_err(|e| QrError::Document(e.to_string())),
    }
}

fn draw<P: Pixel>(colors: &[Color], modules: usize, options: &RenderOptions) -> P::Image {
    Renderer::<P>::new(colors, modules, options.border)
        .module_dimensions(options.scale, options.scale)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "BEGIN:VCARD\nVERSION:3.0\nFN:Test User\nEND:VCARD";

    fn side(payload: &str, options: &RenderOptions) -> u32 {
        let modules = u32::try_from(QrCode::new(payload.as_bytes()).unwrap().width()).unwrap();
        (modules + 2 * options.border) * options.scale
    }

    #[test]
    fn every_format_produces_bytes() {
        for format in QrFormat::ALL {
            let bytes = render(PAYLOAD, format, &RenderOptions::default()).unwrap();
            assert!(!bytes.is_empty(), "{format} produced no bytes");
        }
    }

    #[test]
    fn outputs_carry_their_format_signatures() {
        let options = RenderOptions::default();

        let png = render(PAYLOAD, QrFormat::Png, &options).unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

        let svg = render(PAYLOAD, QrFormat::Svg, &options).unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<svg"));

        let eps = render(PAYLOAD, QrFormat::Eps, &options).unwrap();
        assert!(eps.starts_with(b"%!PS-Adobe-3.0 EPSF-3.0"));

        let pdf = render(PAYLOAD, QrFormat::Pdf, &options).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF"));
    }

    #[test]
    fn png_dimensions_follow_scale_and_border() {
        for options in [
            RenderOptions::default(),
            RenderOptions {
                scale: 3,
                border: 1,
            },
        ] {
            let png = render(PAYLOAD, QrFormat::Png, &options).unwrap();
            let image = image::load_from_memory(&png).unwrap();
            let expected = side(PAYLOAD, &options);
            assert_eq!((image.width(), image.height()), (expected, expected));
        }
    }

    #[test]
    fn eps_bounding_box_matches_symbol_size() {
        let options = RenderOptions::default();
        let eps = String::from_utf8(render(PAYLOAD, QrFormat::Eps, &options).unwrap()).unwrap();
        let expected = side(PAYLOAD, &options);
        let bounding_box = format!("%%BoundingBox: 0 0 {expected} {expected}");
        assert!(eps.contains(&bounding_box));
    }

    #[test]
    fn content_types_match_formats() {
        assert_eq!(QrFormat::Png.content_type(), "image/png");
        assert_eq!(QrFormat::Svg.content_type(), "image/svg+xml");
        assert_eq!(QrFormat::Eps.content_type(), "application/postscript");
        assert_eq!(QrFormat::Pdf.content_type(), "application/pdf");
    }

    #[test]
    fn unknown_formats_are_rejected() {
        for name in ["gif", "", "PNG", "jpeg"] {
            let err = name.parse::<QrFormat>().unwrap_err();
            assert!(matches!(
                err,
                QrError::UnsupportedFormat(ref f) if f == name
            ));
        }
    }

    #[test]
    fn formats_round_trip_through_their_extension() {
        for format in QrFormat::ALL {
            assert_eq!(format.extension().parse::<QrFormat>().unwrap(), format);
        }
    }
}
