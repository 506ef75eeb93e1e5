//! Matrixcode - render precomputed matrix codes to images or EPS.
//!
//! A [`Symbol`] supplies the module matrix and its geometry; a renderer backend
//! picked by name from the [`RendererRegistry`] turns it into png, jpeg, gif or
//! EPS bytes, either returned to the caller or dispatched as a response.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use matrixcode::{render, MatrixSymbol, RenderOutcome};
//! use serde_json::json;
//!
//! let symbol = MatrixSymbol::from_rows(&["#.#", ".#.", "#.#"])
//!     .with_module_size(8, 8)
//!     .with_padding([4, 4, 4, 4]);
//! let outcome = render(Arc::new(symbol), "image", &json!({"imageType": "png"}))?;
//! if let RenderOutcome::Returned(png) = outcome {
//!     std::fs::write("code.png", png)?;
//! }
//! # Ok::<(), matrixcode::MatrixcodeError>(())
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod registry;
pub mod renderer;
pub mod response;
pub mod symbol;

pub use error::{MatrixcodeError, Result};
pub use geometry::Geometry;
pub use registry::{render, resolve, RendererRegistry};
pub use renderer::{
    RasterRenderer, RenderOutcome, Renderer, RendererOptions, SendResult, VectorRenderer,
};
pub use response::{CgiResponse, ResponseSink};
pub use symbol::{MatrixSymbol, Padding, Symbol};
