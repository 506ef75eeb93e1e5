//! Closed name-to-constructor table for renderer backends.

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::error::{MatrixcodeError, Result};
use crate::renderer::{raster, vector, RasterRenderer, RenderOutcome, Renderer, VectorRenderer};
use crate::symbol::Symbol;

/// Builds a fresh, unconfigured renderer.
pub type Constructor = fn() -> Box<dyn Renderer>;

#[derive(Clone, Copy)]
struct Entry {
    name: &'static str,
    renderer_type: &'static str,
    construct: Constructor,
}

fn raster_renderer() -> Box<dyn Renderer> {
    Box::new(RasterRenderer::new())
}

fn vector_renderer() -> Box<dyn Renderer> {
    Box::new(VectorRenderer::new())
}

const BUILTIN: &[Entry] = &[
    Entry { name: "image", renderer_type: raster::TYPE, construct: raster_renderer },
    Entry { name: "eps", renderer_type: vector::TYPE, construct: vector_renderer },
    Entry { name: "vector", renderer_type: vector::TYPE, construct: vector_renderer },
];

/// Resolves renderer names (case-insensitive) to configured backends.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|e| e.name)).finish()
    }
}

impl RendererRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry with the built-in backends:
    /// `image` (raster), `eps` and `vector` (EPS).
    #[must_use]
    pub fn builtin() -> &'static Self {
        static BUILTIN_REGISTRY: OnceLock<RendererRegistry> = OnceLock::new();
        BUILTIN_REGISTRY.get_or_init(|| Self { entries: BUILTIN.to_vec() })
    }

    /// Add a backend under `name`. `renderer_type` is the type the constructed
    /// renderer must report.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is not a valid identifier or
    /// is already registered.
    pub fn register(
        &mut self,
        name: &'static str,
        renderer_type: &'static str,
        construct: Constructor,
    ) -> Result<()> {
        validate_name(name)?;
        if self.lookup(name).is_some() {
            return Err(MatrixcodeError::Configuration(format!(
                "Renderer '{name}' is already registered"
            )));
        }
        self.entries.push(Entry { name, renderer_type, construct });
        Ok(())
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    fn lookup(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Build the renderer registered as `name` and apply `options` to it.
    ///
    /// `options` must be a JSON object (or `null` for none).
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed options, an empty or
    /// unknown name, or a backend that does not report its registered type.
    /// Returns a validation error if an option value is rejected.
    pub fn resolve(&self, name: &str, options: &Value) -> Result<Box<dyn Renderer>> {
        let empty = serde_json::Map::new();
        let options = match options {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(MatrixcodeError::Configuration(format!(
                    "Renderer parameters must be a mapping, got {other}"
                )))
            }
        };

        validate_name(name)?;
        let entry = self.lookup(name.trim()).ok_or_else(|| {
            let valid: Vec<_> = self.names().collect();
            MatrixcodeError::Configuration(format!(
                "Unknown renderer '{name}'. Valid: {}",
                valid.join(", ")
            ))
        })?;

        let mut renderer = (entry.construct)();
        if renderer.renderer_type() != entry.renderer_type {
            return Err(MatrixcodeError::Configuration(format!(
                "Renderer '{}' built a '{}' renderer, expected '{}'",
                entry.name,
                renderer.renderer_type(),
                entry.renderer_type
            )));
        }

        log::debug!("resolved renderer '{name}' -> {}", entry.renderer_type);
        renderer.configure(options)?;
        Ok(renderer)
    }

    /// Resolve, bind `symbol`, and render.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`RendererRegistry::resolve`] or
    /// [`Renderer::render`].
    pub fn render(
        &self,
        symbol: Arc<dyn Symbol>,
        name: &str,
        options: &Value,
    ) -> Result<RenderOutcome> {
        let mut renderer = self.resolve(name, options)?;
        renderer.bind_symbol(symbol);
        renderer.render()
    }
}

fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MatrixcodeError::Configuration("Renderer name must be specified".into()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(MatrixcodeError::Configuration(format!(
            "Renderer name '{name}' is not a valid identifier"
        )));
    }
    Ok(())
}

/// [`RendererRegistry::resolve`] on the built-in registry.
///
/// # Errors
///
/// See [`RendererRegistry::resolve`].
pub fn resolve(name: &str, options: &Value) -> Result<Box<dyn Renderer>> {
    RendererRegistry::builtin().resolve(name, options)
}

/// [`RendererRegistry::render`] on the built-in registry.
///
/// # Errors
///
/// See [`RendererRegistry::render`].
pub fn render(symbol: Arc<dyn Symbol>, name: &str, options: &Value) -> Result<RenderOutcome> {
    RendererRegistry::builtin().render(symbol, name, options)
}
