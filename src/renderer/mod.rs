//! The renderer contract shared by all backends.
//!
//! A renderer is built per request: options are applied once, a symbol is
//! bound, and [`Renderer::render`] either hands the artifact back or
//! dispatches it as a terminal response.
//!
//! - `raster` — pixel images (png, jpeg, gif)
//! - `vector` — Encapsulated PostScript

pub mod raster;
pub mod vector;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{MatrixcodeError, Result};
use crate::geometry::Geometry;
use crate::response::{CgiResponse, ResponseSink};
use crate::symbol::Symbol;

pub use raster::RasterRenderer;
pub use vector::VectorRenderer;

/// Renderer options, keyed by setter name (`imageType`, `sizeLimit`, `sendResult`).
pub type RendererOptions = Map<String, Value>;

/// What to do with the artifact once it is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SendResult {
    /// Hand the bytes back to the caller.
    #[default]
    Return,
    /// Dispatch as a terminal response, with these extra header lines first.
    Send(Vec<String>),
}

impl SendResult {
    /// Parse a `sendResult` option: a boolean or a list of header strings.
    ///
    /// An empty header list means "return", as does `null`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for any other value shape, or for a header
    /// containing a line break.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null | Value::Bool(false) => Ok(Self::Return),
            Value::Bool(true) => Ok(Self::Send(Vec::new())),
            Value::Array(items) if items.is_empty() => Ok(Self::Return),
            Value::Array(items) => items
                .iter()
                .map(|item| match item.as_str() {
                    Some(header) if header.contains(['\r', '\n']) => {
                        Err(MatrixcodeError::Validation(format!(
                            "sendResult header must be a single line, got {item}"
                        )))
                    }
                    Some(header) => Ok(header.to_string()),
                    None => Err(MatrixcodeError::Validation(format!(
                        "sendResult headers must be strings, got {item}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Send),
            other => Err(MatrixcodeError::Validation(format!(
                "sendResult must be a boolean or a list of headers, got {other}"
            ))),
        }
    }
}

/// Result of [`Renderer::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The artifact bytes, returned to the caller.
    Returned(Vec<u8>),
    /// The artifact was written to the response sink; the request is finished.
    Dispatched,
}

impl RenderOutcome {
    /// The returned bytes, if the artifact was not dispatched.
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Returned(bytes) => Some(bytes),
            Self::Dispatched => None,
        }
    }
}

/// State common to every backend: its type name, dispatch mode and bound symbol.
pub struct RendererState {
    renderer_type: &'static str,
    send_result: SendResult,
    symbol: Option<Arc<dyn Symbol>>,
}

impl RendererState {
    /// Fresh state for a backend of the given type.
    #[must_use]
    pub fn new(renderer_type: &'static str) -> Self {
        Self { renderer_type, send_result: SendResult::default(), symbol: None }
    }

    /// The dispatch mode.
    #[must_use]
    pub fn send_result(&self) -> &SendResult {
        &self.send_result
    }
}

impl std::fmt::Debug for RendererState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererState")
            .field("renderer_type", &self.renderer_type)
            .field("send_result", &self.send_result)
            .field("symbol_bound", &self.symbol.is_some())
            .finish()
    }
}

/// Normalize an option key so `imageType`, `image_type` and `image-type` match.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.chars().filter(|c| *c != '_' && *c != '-').flat_map(char::to_lowercase).collect()
}

/// Turns a bound [`Symbol`] into an artifact.
///
/// Backends implement the hooks; `configure`, `bind_symbol` and `render` are
/// shared.
pub trait Renderer: Send + std::fmt::Debug {
    /// Shared renderer state.
    fn state(&self) -> &RendererState;

    /// Shared renderer state, mutably.
    fn state_mut(&mut self) -> &mut RendererState;

    /// MIME type used when dispatching.
    fn content_type(&self) -> String;

    /// Apply one backend option. `key` is already normalized.
    ///
    /// Returns `Ok(false)` when the backend has no setter for `key`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value is not acceptable.
    fn set_option(&mut self, key: &str, value: &Value) -> Result<bool>;

    /// Backend preconditions, checked before anything is drawn.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the backend cannot render this geometry.
    fn check_params(&self, geometry: &Geometry) -> Result<()>;

    /// Produce the artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be produced.
    fn render_symbol(&self, symbol: &dyn Symbol, geometry: &Geometry) -> Result<Vec<u8>>;

    /// Lowercase backend identifier (`"image"`, `"eps"`).
    fn renderer_type(&self) -> &'static str {
        self.state().renderer_type
    }

    /// Apply options through their setters. Unknown keys are ignored.
    ///
    /// Registry code holds renderers as `Box<dyn Renderer>`, so this returns
    /// `()`; use [`Renderer::with_options`] to chain on a concrete backend.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a known setter rejects its value.
    fn configure(&mut self, options: &RendererOptions) -> Result<()> {
        for (key, value) in options {
            let key = normalize_key(key);
            if key == "sendresult" {
                self.state_mut().send_result = SendResult::from_value(value)?;
            } else if !self.set_option(&key, value)? {
                log::debug!("{}: ignoring unknown option '{key}'", self.renderer_type());
            }
        }
        Ok(())
    }

    /// [`Renderer::configure`], returning the renderer for chaining.
    ///
    /// # Errors
    ///
    /// See [`Renderer::configure`].
    fn with_options(&mut self, options: &RendererOptions) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.configure(options)?;
        Ok(self)
    }

    /// Set the dispatch mode directly.
    fn set_send_result(&mut self, send_result: SendResult) {
        self.state_mut().send_result = send_result;
    }

    /// Bind the symbol to render. The symbol may be shared with other renderers.
    fn bind_symbol(&mut self, symbol: Arc<dyn Symbol>) {
        self.state_mut().symbol = Some(symbol);
    }

    /// Render, dispatching to stdout when `sendResult` asks for it.
    ///
    /// # Errors
    ///
    /// See [`Renderer::render_to`].
    fn render(&self) -> Result<RenderOutcome> {
        let stdout = std::io::stdout();
        let mut sink = CgiResponse::new(stdout.lock());
        self.render_to(&mut sink)
    }

    /// Render, dispatching to `sink` when `sendResult` asks for it.
    ///
    /// Nothing is written to `sink` unless rendering succeeded.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no symbol is bound, a validation error
    /// if a precondition fails, or an I/O error if dispatch fails.
    fn render_to(&self, sink: &mut dyn ResponseSink) -> Result<RenderOutcome> {
        let state = self.state();
        let symbol = state.symbol.as_deref().ok_or_else(|| {
            MatrixcodeError::Configuration(format!(
                "no symbol bound to the {} renderer",
                state.renderer_type
            ))
        })?;

        symbol.draw();
        let geometry = Geometry::of(symbol)?;
        log::debug!(
            "{}: {n}x{n} matrix, scale {s}, output {w}x{h}",
            state.renderer_type,
            n = geometry.dimension,
            s = geometry.scale,
            w = geometry.output_width,
            h = geometry.output_height,
        );

        self.check_params(&geometry)?;
        let artifact = self.render_symbol(symbol, &geometry)?;

        match &state.send_result {
            SendResult::Return => Ok(RenderOutcome::Returned(artifact)),
            SendResult::Send(headers) => {
                let content_type = self.content_type();
                log::debug!("dispatching {} bytes as {content_type}", artifact.len());
                sink.dispatch(headers, &content_type, &artifact)?;
                Ok(RenderOutcome::Dispatched)
            }
        }
    }
}

/// Read an option as a string.
pub(crate) fn expect_str<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        MatrixcodeError::Validation(format!("option '{key}' expects a string, got {value}"))
    })
}
