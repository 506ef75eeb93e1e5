//! Scale and padding arithmetic shared by every renderer.

use crate::error::{MatrixcodeError, Result};
use crate::symbol::{Padding, Symbol};

/// Output dimensions of a symbol, computed once per render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Side length `n` of the square matrix.
    pub dimension: u32,
    /// Output pixels per module.
    pub scale: u32,
    /// Padding in modules.
    pub padding: Padding,
    /// `n + right + left`, in modules.
    pub padded_width: u32,
    /// `n + top + bottom`, in modules.
    pub padded_height: u32,
    /// `padded_width * scale`, in pixels.
    pub output_width: u32,
    /// `padded_height * scale`, in pixels.
    pub output_height: u32,
}

impl Geometry {
    /// Compute the geometry of a symbol.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the matrix is empty or not square, if the
    /// module size is not square or zero, or if the output size overflows.
    pub fn of(symbol: &dyn Symbol) -> Result<Self> {
        let dimension = matrix_dimension(symbol.matrix())?;
        let scale = scale(symbol.module_size())?;
        let padding = symbol.padding();

        let padded_width = dimension
            .checked_add(padding.right)
            .and_then(|v| v.checked_add(padding.left))
            .ok_or_else(overflow)?;
        let padded_height = dimension
            .checked_add(padding.top)
            .and_then(|v| v.checked_add(padding.bottom))
            .ok_or_else(overflow)?;

        Ok(Self {
            dimension,
            scale,
            padding,
            padded_width,
            padded_height,
            output_width: padded_width.checked_mul(scale).ok_or_else(overflow)?,
            output_height: padded_height.checked_mul(scale).ok_or_else(overflow)?,
        })
    }

    /// Whether either output side exceeds `limit` pixels.
    #[must_use]
    pub fn exceeds(&self, limit: u32) -> bool {
        self.output_width > limit || self.output_height > limit
    }
}

/// Only square modules are supported; the scale is the module width.
fn scale((width, height): (u32, u32)) -> Result<u32> {
    if width != height {
        return Err(MatrixcodeError::Validation(format!(
            "unsupported non-square module size {width}x{height}"
        )));
    }
    if width == 0 {
        return Err(MatrixcodeError::Validation("module size must be positive".into()));
    }
    Ok(width)
}

fn matrix_dimension(matrix: &[Vec<bool>]) -> Result<u32> {
    let n = matrix.len();
    if n == 0 {
        return Err(MatrixcodeError::Validation("matrix is empty".into()));
    }
    if let Some((i, column)) = matrix.iter().enumerate().find(|(_, c)| c.len() != n) {
        return Err(MatrixcodeError::Validation(format!(
            "matrix is not square: column {i} has {} modules, expected {n}",
            column.len()
        )));
    }
    u32::try_from(n).map_err(|_| overflow())
}

fn overflow() -> MatrixcodeError {
    MatrixcodeError::Validation("output dimensions overflow".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::MatrixSymbol;

    fn square(n: usize) -> MatrixSymbol {
        MatrixSymbol::new(vec![vec![false; n]; n])
    }

    #[test]
    fn output_size_includes_padding() {
        let symbol = square(21).with_module_size(4, 4).with_padding([1, 2, 3, 4]);
        let g = Geometry::of(&symbol).unwrap();
        assert_eq!(g.dimension, 21);
        assert_eq!(g.scale, 4);
        assert_eq!(g.padded_width, 21 + 2 + 4);
        assert_eq!(g.padded_height, 21 + 1 + 3);
        assert_eq!(g.output_width, (21 + 2 + 4) * 4);
        assert_eq!(g.output_height, (21 + 1 + 3) * 4);
    }

    #[test]
    fn output_size_formula_holds_across_sizes() {
        for n in 1..8usize {
            for s in 1..5 {
                let symbol = square(n).with_module_size(s, s).with_padding([s, 1, 0, 2]);
                let g = Geometry::of(&symbol).unwrap();
                let n = u32::try_from(n).unwrap();
                assert_eq!(g.output_width, (n + 2 + 1) * s);
                assert_eq!(g.output_height, (n + s) * s);
            }
        }
    }

    #[test]
    fn non_square_module_rejected() {
        let err = Geometry::of(&square(3).with_module_size(2, 3)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("non-square"));
    }

    #[test]
    fn zero_module_rejected() {
        assert!(Geometry::of(&square(3).with_module_size(0, 0)).unwrap_err().is_validation());
    }

    #[test]
    fn empty_matrix_rejected() {
        assert!(Geometry::of(&MatrixSymbol::new(Vec::new())).unwrap_err().is_validation());
    }

    #[test]
    fn ragged_matrix_rejected() {
        let symbol = MatrixSymbol::new(vec![vec![true, false], vec![true]]);
        assert!(Geometry::of(&symbol).unwrap_err().is_validation());
    }

    #[test]
    fn overflow_rejected() {
        let symbol = square(2).with_module_size(u32::MAX, u32::MAX);
        assert!(Geometry::of(&symbol).unwrap_err().is_validation());
    }

    #[test]
    fn exceeds_checks_both_sides() {
        let g = Geometry::of(&square(10).with_module_size(2, 2).with_padding([5, 0, 5, 0]))
            .unwrap();
        assert_eq!((g.output_width, g.output_height), (20, 40));
        assert!(g.exceeds(30));
        assert!(!g.exceeds(40));
    }
}
