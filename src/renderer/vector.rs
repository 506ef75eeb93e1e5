//! Encapsulated PostScript backend.
//!
//! The page is set up in module units (`scale` then `translate` past the
//! padding) and every set module becomes one `x y 1 1 F` rectfill. PostScript's
//! origin is bottom-left, so rows are flipped.

use std::fmt::Write as _;

use serde_json::Value;

use super::{Renderer, RendererState};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::symbol::Symbol;

/// Type name of the EPS backend.
pub const TYPE: &str = "eps";

/// MIME type of the produced document.
pub const CONTENT_TYPE: &str = "application/postscript";

/// Renders a symbol as an EPS document.
#[derive(Debug)]
pub struct VectorRenderer {
    state: RendererState,
}

impl Default for VectorRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorRenderer {
    /// A new EPS renderer.
    #[must_use]
    pub fn new() -> Self {
        Self { state: RendererState::new(TYPE) }
    }
}

impl Renderer for VectorRenderer {
    fn state(&self) -> &RendererState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RendererState {
        &mut self.state
    }

    fn content_type(&self) -> String {
        CONTENT_TYPE.to_string()
    }

    fn set_option(&mut self, _key: &str, _value: &Value) -> Result<bool> {
        Ok(false)
    }

    fn check_params(&self, _geometry: &Geometry) -> Result<()> {
        Ok(())
    }

    fn render_symbol(&self, symbol: &dyn Symbol, geometry: &Geometry) -> Result<Vec<u8>> {
        let date = chrono::Local::now().format("%Y-%m-%d");
        Ok(document(symbol, geometry, &date.to_string()).into_bytes())
    }
}

/// Build the EPS text for a symbol, stamped with `date`.
fn document(symbol: &dyn Symbol, geometry: &Geometry, date: &str) -> String {
    let Geometry { dimension, scale, padding, output_width, output_height, .. } = *geometry;

    let mut out = String::new();
    out.push_str("%!PS-Adobe EPSF-3.0\n");
    out.push_str("%%Creator: Matrixcode_Qrcode\n");
    out.push_str("%%Title: QRcode\n");
    let _ = writeln!(out, "%%CreationDate: {date}");
    out.push_str("%%DocumentData: Clean7Bit\n");
    out.push_str("%%LanguageLevel: 2\n");
    out.push_str("%%Pages: 1\n");
    let _ = writeln!(out, "%%BoundingBox: 0 0 {output_width} {output_height}");

    let _ = writeln!(out, "{scale} {scale} scale");
    let _ = writeln!(out, "{} {} translate", padding.left, padding.bottom);
    out.push_str("/F { rectfill } def\n");
    let _ = writeln!(out, "{} setrgbcolor", eps_color(symbol.fore_color()));

    for (x, column) in (0u32..).zip(symbol.matrix()) {
        for (j, _) in (0u32..).zip(column).filter(|(_, set)| **set) {
            let y = dimension - 1 - j;
            let _ = writeln!(out, "{x} {y} 1 1 F");
        }
    }

    out.push_str("%%EOF");
    out
}

/// Fractional `setrgbcolor` operands for `0xRRGGBB`.
///
/// The middle byte is labelled blue and the low byte green, and the operands
/// are emitted as `r g b`, so the output reads high, low, middle byte. This
/// differs from the raster backend and is kept as is until the intended
/// channel order is confirmed.
fn eps_color(color: u32) -> String {
    let r = channel((color & 0xFF_0000) >> 16);
    let b = channel((color & 0x00_FF00) >> 8);
    let g = channel(color & 0x00_00FF);
    format!("{r} {g} {b}")
}

/// One 8-bit channel as a fraction of 255, rounded to 5 decimals.
fn channel(value: u32) -> f64 {
    (f64::from(value) / 255.0 * 100_000.0).round() / 100_000.0
}
