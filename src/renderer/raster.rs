//! Raster backend: draws one pixel per module, scales up by block replication,
//! and encodes as png, jpeg or gif.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::Value;

use super::{expect_str, Renderer, RendererState};
use crate::error::{MatrixcodeError, Result};
use crate::geometry::Geometry;
use crate::symbol::{html_color, Symbol};

/// Type name of the raster backend.
pub const TYPE: &str = "image";

/// Background used when the symbol has no background color.
const TRANSPARENT: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Supported output encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    #[default]
    Png,
    /// JPEG; transparency is flattened to white.
    Jpeg,
    /// Graphics Interchange Format.
    Gif,
}

impl ImageFormat {
    /// Lowercase name, as used in the MIME type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    fn encoder_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = MatrixcodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            _ => Err(MatrixcodeError::Validation(format!(
                "Unsupported image type '{s}'. Valid: png, jpeg, gif"
            ))),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Renders a symbol as a pixel image.
#[derive(Debug)]
pub struct RasterRenderer {
    state: RendererState,
    image_format: ImageFormat,
    size_limit: Option<u32>,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterRenderer {
    /// A png renderer without a size limit.
    #[must_use]
    pub fn new() -> Self {
        Self { state: RendererState::new(TYPE), image_format: ImageFormat::Png, size_limit: None }
    }

    /// The configured output encoding.
    #[must_use]
    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    /// Set the output encoding by name (`png`, `jpeg`, `jpg`, `gif`).
    ///
    /// # Errors
    ///
    /// Returns a validation error for any other name.
    pub fn set_image_type(&mut self, value: &str) -> Result<()> {
        self.image_format = value.parse()?;
        Ok(())
    }

    /// The maximum output width/height in pixels, if any.
    #[must_use]
    pub fn size_limit(&self) -> Option<u32> {
        self.size_limit
    }

    /// Limit the output width and height.
    pub fn set_size_limit(&mut self, limit: Option<u32>) {
        self.size_limit = limit;
    }
}

impl Renderer for RasterRenderer {
    fn state(&self) -> &RendererState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RendererState {
        &mut self.state
    }

    fn content_type(&self) -> String {
        format!("image/{}", self.image_format)
    }

    fn set_option(&mut self, key: &str, value: &Value) -> Result<bool> {
        match key {
            "imagetype" => self.set_image_type(expect_str(key, value)?)?,
            "sizelimit" | "maxoutputsize" => {
                let limit = match value {
                    Value::Null => None,
                    v => Some(whole_number(v).ok_or_else(|| {
                        MatrixcodeError::Validation(format!(
                            "option '{key}' expects a non-negative integer, got {v}"
                        ))
                    })?),
                };
                self.set_size_limit(limit);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn check_params(&self, geometry: &Geometry) -> Result<()> {
        if let Some(limit) = self.size_limit.filter(|&limit| geometry.exceeds(limit)) {
            return Err(MatrixcodeError::Validation(format!(
                "output exceeds size limit: {}x{} > {limit}",
                geometry.output_width, geometry.output_height
            )));
        }
        buffer_len(geometry.padded_width, geometry.padded_height)
            .and(buffer_len(geometry.output_width, geometry.output_height))
            .map(|_| ())
            .ok_or_else(|| MatrixcodeError::Validation("output dimensions overflow".into()))
    }

    fn render_symbol(&self, symbol: &dyn Symbol, geometry: &Geometry) -> Result<Vec<u8>> {
        let background = symbol.background_color().map_or(TRANSPARENT, rgba);
        let fore = rgba(symbol.fore_color());
        let back = symbol
            .background_color()
            .map_or_else(|| "transparent".to_string(), |c| format!("#{}", html_color(c)));
        log::debug!(
            "{TYPE}: #{} on {back}, encoding {}",
            html_color(symbol.fore_color()),
            self.image_format
        );

        let mut canvas =
            RgbaImage::from_pixel(geometry.padded_width, geometry.padded_height, background);
        let padding = geometry.padding;
        for (x, column) in (0u32..).zip(symbol.matrix()) {
            for (y, _) in (0u32..).zip(column).filter(|(_, set)| **set) {
                canvas.put_pixel(x + padding.left, y + padding.bottom, fore);
            }
        }

        let scale = geometry.scale;
        let output = RgbaImage::from_fn(geometry.output_width, geometry.output_height, |x, y| {
            *canvas.get_pixel(x / scale, y / scale)
        });
        drop(canvas);

        encode(output, self.image_format)
    }
}

/// A non-negative whole number (`2048` or `2048.0`), saturated to `u32`.
fn whole_number(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return Some(u32::try_from(n).unwrap_or(u32::MAX));
    }
    let f = value.as_f64().filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = f.min(f64::from(u32::MAX)) as u32;
    Some(n)
}

/// Bytes needed for a `width` x `height` RGBA buffer, if addressable.
fn buffer_len(width: u32, height: u32) -> Option<usize> {
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;
    width.checked_mul(height)?.checked_mul(4)
}

/// Opaque pixel from `0xRRGGBB`.
fn rgba(color: u32) -> Rgba<u8> {
    let [_, r, g, b] = color.to_be_bytes();
    Rgba([r, g, b, 255])
}

fn encode(image: RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8()),
        ImageFormat::Png | ImageFormat::Gif => DynamicImage::ImageRgba8(image),
    };
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, format.encoder_format())
        .map_err(|e| MatrixcodeError::Encoding(format!("Failed to encode {format}: {e}")))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::MatrixSymbol;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn render(renderer: &RasterRenderer, symbol: &MatrixSymbol) -> Result<Vec<u8>> {
        let geometry = Geometry::of(symbol)?;
        renderer.check_params(&geometry)?;
        renderer.render_symbol(symbol, &geometry)
    }

    fn decode(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn parse_formats() {
        assert_eq!("png".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("gif".parse::<ImageFormat>().unwrap(), ImageFormat::Gif);
        assert_eq!("jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn jpg_is_jpeg() {
        let mut a = RasterRenderer::new();
        let mut b = RasterRenderer::new();
        a.set_image_type("jpg").unwrap();
        b.set_image_type("jpeg").unwrap();
        assert_eq!(a.image_format(), b.image_format());
        assert_eq!(a.content_type(), "image/jpeg");
    }

    #[test]
    fn unsupported_format_rejected() {
        let mut renderer = RasterRenderer::new();
        let err = renderer.set_image_type("webp").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(renderer.image_format(), ImageFormat::Png);
    }

    #[test]
    fn set_option_keys() {
        let mut renderer = RasterRenderer::new();
        assert!(renderer.set_option("imagetype", &Value::from("gif")).unwrap());
        assert!(renderer.set_option("sizelimit", &Value::from(100)).unwrap());
        assert_eq!(renderer.size_limit(), Some(100));
        assert!(renderer.set_option("maxoutputsize", &Value::Null).unwrap());
        assert_eq!(renderer.size_limit(), None);
        assert!(!renderer.set_option("unknown", &Value::from(1)).unwrap());
        assert!(renderer.set_option("imagetype", &Value::from(1)).unwrap_err().is_validation());
        assert!(renderer.set_option("sizelimit", &Value::from(-5)).unwrap_err().is_validation());
        assert!(renderer.set_option("sizelimit", &Value::from("9")).unwrap_err().is_validation());
        assert_eq!(renderer.image_format(), ImageFormat::Gif);
    }

    #[test]
    fn size_limit_accepts_whole_floats() {
        let mut renderer = RasterRenderer::new();
        assert!(renderer.set_option("sizelimit", &Value::from(2048.0)).unwrap());
        assert_eq!(renderer.size_limit(), Some(2048));
        assert!(renderer.set_option("sizelimit", &Value::from(1e12)).unwrap());
        assert_eq!(renderer.size_limit(), Some(u32::MAX));
        for bad in [2.5, -1.0, -0.5] {
            let err = renderer.set_option("sizelimit", &Value::from(bad)).unwrap_err();
            assert!(err.is_validation(), "{bad}");
        }
        assert_eq!(renderer.size_limit(), Some(u32::MAX));
    }

    #[test]
    fn single_module_fills_top_left_block() {
        let symbol = MatrixSymbol::from_rows(&["#..", "...", "..."])
            .with_module_size(4, 4)
            .with_fore_color(0x11_2233)
            .with_background_color(Some(0xAA_BBCC));
        let img = decode(&render(&RasterRenderer::new(), &symbol).unwrap());
        assert_eq!(img.dimensions(), (12, 12));
        for (x, y, px) in img.enumerate_pixels() {
            let expected =
                if x < 4 && y < 4 { [0x11, 0x22, 0x33, 255] } else { [0xAA, 0xBB, 0xCC, 255] };
            assert_eq!(px.0, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn missing_background_is_transparent() {
        let symbol = MatrixSymbol::from_rows(&["#.", ".."])
            .with_module_size(2, 2)
            .with_background_color(None);
        let img = decode(&render(&RasterRenderer::new(), &symbol).unwrap());
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(3, 3).0[3], 0);
    }

    #[test]
    fn padding_offsets_by_left_and_bottom() {
        let symbol = MatrixSymbol::from_rows(&["#"]).with_padding([0, 0, 2, 1]);
        let img = decode(&render(&RasterRenderer::new(), &symbol).unwrap());
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.get_pixel(1, 2).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn size_limit_rejects_before_drawing() {
        let mut renderer = RasterRenderer::new();
        renderer.set_size_limit(Some(10));
        let symbol = MatrixSymbol::from_rows(&["#.", ".#"]).with_module_size(6, 6);
        let err = render(&renderer, &symbol).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("size limit"));

        renderer.set_size_limit(Some(12));
        assert!(render(&renderer, &symbol).is_ok());
    }

    #[test]
    fn oversized_canvas_rejected_without_size_limit() {
        let renderer = RasterRenderer::new();

        let padded = MatrixSymbol::from_rows(&["#"]).with_padding([1_u32 << 31, 1 << 31, 0, 0]);
        let err = render(&renderer, &padded).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("overflow"), "{err}");

        let scaled = MatrixSymbol::from_rows(&["#"]).with_module_size(1_u32 << 31, 1 << 31);
        assert!(render(&renderer, &scaled).unwrap_err().is_validation());
    }

    #[test]
    fn buffer_len_checks_products() {
        assert_eq!(buffer_len(3, 2), Some(24));
        assert_eq!(buffer_len(0, u32::MAX), Some(0));
        assert_eq!(buffer_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn encodes_each_format() {
        let symbol = MatrixSymbol::from_rows(&["#.", ".#"]).with_module_size(3, 3);
        let mut renderer = RasterRenderer::new();

        assert_eq!(&render(&renderer, &symbol).unwrap()[..8], &PNG_MAGIC);

        renderer.set_image_type("jpeg").unwrap();
        assert_eq!(&render(&renderer, &symbol).unwrap()[..2], &[0xFF, 0xD8]);

        renderer.set_image_type("gif").unwrap();
        assert_eq!(&render(&renderer, &symbol).unwrap()[..4], b"GIF8");
    }

    #[test]
    fn channel_order_is_rgb() {
        assert_eq!(rgba(0x12_3456).0, [0x12, 0x34, 0x56, 255]);
    }
}
