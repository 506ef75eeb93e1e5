//! The symbol contract consumed by renderers, and a precomputed implementation.
//!
//! A symbol is the finished module grid of a matrix code plus the geometry and
//! colors needed to draw it. Renderers only read from it; the matrix is indexed
//! as `matrix[x][y]` (outer index is the column).

use std::path::Path;

use serde::Deserialize;

use crate::error::{MatrixcodeError, Result};

/// Padding around the matrix, in module units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Padding {
    /// Modules above the matrix.
    pub top: u32,
    /// Modules right of the matrix.
    pub right: u32,
    /// Modules below the matrix.
    pub bottom: u32,
    /// Modules left of the matrix.
    pub left: u32,
}

impl Padding {
    /// Same padding on every side (the usual quiet zone).
    #[must_use]
    pub fn uniform(modules: u32) -> Self {
        Self { top: modules, right: modules, bottom: modules, left: modules }
    }
}

impl From<[u32; 4]> for Padding {
    /// Builds padding from `[top, right, bottom, left]`.
    fn from([top, right, bottom, left]: [u32; 4]) -> Self {
        Self { top, right, bottom, left }
    }
}

/// A finalized matrix code, as seen by a renderer.
pub trait Symbol: Send + Sync {
    /// Finalize the matrix. Called once by a renderer before [`Symbol::matrix`].
    fn draw(&self) {}

    /// The module matrix, `matrix[x][y]`, square.
    fn matrix(&self) -> &[Vec<bool>];

    /// Module size as `(width, height)` in output pixels.
    fn module_size(&self) -> (u32, u32);

    /// Padding around the matrix.
    fn padding(&self) -> Padding;

    /// Foreground color as `0xRRGGBB`.
    fn fore_color(&self) -> u32;

    /// Background color as `0xRRGGBB`, or `None` for transparent.
    fn background_color(&self) -> Option<u32>;
}

/// Format a 24-bit color as six lowercase hex digits (`0x00ff00` -> `"00ff00"`).
#[must_use]
pub fn html_color(color: u32) -> String {
    format!("{:06x}", color & 0x00FF_FFFF)
}

/// A symbol whose matrix has already been computed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixSymbol {
    matrix: Vec<Vec<bool>>,
    module_size: (u32, u32),
    padding: Padding,
    fore_color: u32,
    background_color: Option<u32>,
}

impl MatrixSymbol {
    /// Wrap a `matrix[x][y]` grid with default geometry: 1px modules, no padding,
    /// black on white.
    #[must_use]
    pub fn new(matrix: Vec<Vec<bool>>) -> Self {
        Self {
            matrix,
            module_size: (1, 1),
            padding: Padding::default(),
            fore_color: 0x00_0000,
            background_color: Some(0xFF_FFFF),
        }
    }

    /// Build from visual rows, top row first. `1`, `#`, `X` or `x` mark a set module.
    ///
    /// The rows are transposed into the `matrix[x][y]` layout.
    #[must_use]
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let width = rows.iter().map(|r| r.as_ref().chars().count()).max().unwrap_or(0);
        let mut matrix = vec![vec![false; rows.len()]; width];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.as_ref().chars().enumerate() {
                matrix[x][y] = matches!(ch, '1' | '#' | 'X' | 'x');
            }
        }
        Self::new(matrix)
    }

    /// Set the module size in output pixels.
    #[must_use]
    pub fn with_module_size(mut self, width: u32, height: u32) -> Self {
        self.module_size = (width, height);
        self
    }

    /// Set the padding in modules.
    #[must_use]
    pub fn with_padding(mut self, padding: impl Into<Padding>) -> Self {
        self.padding = padding.into();
        self
    }

    /// Set the foreground color (`0xRRGGBB`).
    #[must_use]
    pub fn with_fore_color(mut self, color: u32) -> Self {
        self.fore_color = color & 0x00FF_FFFF;
        self
    }

    /// Set the background color, `None` for transparent.
    #[must_use]
    pub fn with_background_color(mut self, color: Option<u32>) -> Self {
        self.background_color = color.map(|c| c & 0x00FF_FFFF);
        self
    }

    /// Load a symbol description from a JSON or TOML file (by extension).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its rows
    /// differ in length.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MatrixcodeError::SymbolFile(format!("Failed to read {}: {e}", path.display()))
        })?;
        let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let file: SymbolFile = if is_toml {
            toml::from_str(&contents).map_err(|e| {
                MatrixcodeError::SymbolFile(format!("Failed to parse {}: {e}", path.display()))
            })?
        } else {
            serde_json::from_str(&contents).map_err(|e| {
                MatrixcodeError::SymbolFile(format!("Failed to parse {}: {e}", path.display()))
            })?
        };
        file.try_into()
    }
}

impl Symbol for MatrixSymbol {
    fn matrix(&self) -> &[Vec<bool>] {
        &self.matrix
    }

    fn module_size(&self) -> (u32, u32) {
        self.module_size
    }

    fn padding(&self) -> Padding {
        self.padding
    }

    fn fore_color(&self) -> u32 {
        self.fore_color
    }

    fn background_color(&self) -> Option<u32> {
        self.background_color
    }
}

/// On-disk description of a precomputed symbol.
#[derive(Debug, Deserialize)]
struct SymbolFile {
    rows: Vec<String>,
    #[serde(default = "default_module_size")]
    module_size: [u32; 2],
    #[serde(default)]
    padding: [u32; 4],
    #[serde(default, deserialize_with = "color::deserialize")]
    fore_color: u32,
    #[serde(default = "default_background", deserialize_with = "color::deserialize_optional")]
    background_color: Option<u32>,
}

impl TryFrom<SymbolFile> for MatrixSymbol {
    type Error = MatrixcodeError;

    /// Rows must all have the same number of modules.
    fn try_from(file: SymbolFile) -> Result<Self> {
        let mut widths = file.rows.iter().map(|row| row.chars().count());
        if let Some(expected) = widths.next() {
            if let Some((i, width)) = widths.enumerate().find(|(_, w)| *w != expected) {
                return Err(MatrixcodeError::SymbolFile(format!(
                    "rows have different lengths: row {} has {width} modules, expected {expected}",
                    i + 1
                )));
            }
        }
        Ok(MatrixSymbol::from_rows(&file.rows)
            .with_module_size(file.module_size[0], file.module_size[1])
            .with_padding(file.padding)
            .with_fore_color(file.fore_color)
            .with_background_color(file.background_color))
    }
}

fn default_module_size() -> [u32; 2] {
    [1, 1]
}

#[allow(clippy::unnecessary_wraps)]
fn default_background() -> Option<u32> {
    Some(0xFF_FFFF)
}

/// Serde helpers accepting colors as integers or `"#RRGGBB"` strings.
mod color {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u32),
        Text(String),
    }

    fn parse<E: Error>(repr: Repr) -> Result<Option<u32>, E> {
        match repr {
            Repr::Int(v) => Ok(Some(v & 0x00FF_FFFF)),
            Repr::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("transparent") || s.eq_ignore_ascii_case("none") {
                    return Ok(None);
                }
                let hex = s.trim_start_matches('#').trim_start_matches("0x");
                u32::from_str_radix(hex, 16)
                    .map(|v| Some(v & 0x00FF_FFFF))
                    .map_err(|_| E::custom(format!("invalid color '{s}'")))
            }
        }
    }

    /// Deserialize a mandatory color.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        parse(Repr::deserialize(deserializer)?)?
            .ok_or_else(|| D::Error::custom("color cannot be transparent"))
    }

    /// Deserialize a color that may be `null` or `"transparent"`.
    pub fn deserialize_optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            Some(repr) => parse(repr),
            None => Ok(None),
        }
    }
}
