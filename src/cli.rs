//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::Parser;
use matrixcode::renderer::normalize_key;
use matrixcode::RendererOptions;
use serde_json::Value;

/// Render a precomputed matrix code to a png, jpeg, gif or EPS file.
#[derive(Parser, Debug)]
#[command(name = "matrixcode", version, about)]
pub struct Cli {
    /// Symbol description file (JSON, or TOML by extension).
    pub symbol: PathBuf,

    /// Renderer name: image, eps.
    #[arg(short, long)]
    pub renderer: Option<String>,

    /// Image type for the image renderer: png, jpeg, gif.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Maximum output width/height in pixels.
    #[arg(long)]
    pub size_limit: Option<u32>,

    /// Extra renderer option as KEY=VALUE; VALUE is parsed as JSON when possible.
    #[arg(short = 'O', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Output file path (raw bytes go to stdout if not specified).
    #[arg(short, long, conflicts_with = "send")]
    pub output: Option<PathBuf>,

    /// Write a CGI-style response (headers, blank line, body) to stdout.
    #[arg(long)]
    pub send: bool,

    /// Extra response header for --send.
    #[arg(short = 'H', long = "header", requires = "send")]
    pub headers: Vec<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Merge renderer options: config params, then `--option`, then dedicated flags.
    ///
    /// # Errors
    ///
    /// Returns an error if an `--option` is not of the form `KEY=VALUE`.
    pub fn renderer_options(&self, base: &RendererOptions) -> Result<RendererOptions, String> {
        let mut options = RendererOptions::new();
        let mut set = |key: &str, value: Value| {
            options.insert(normalize_key(key), value);
        };

        for (key, value) in base {
            set(key, value.clone());
        }
        for raw in &self.options {
            let (key, value) = parse_option(raw)?;
            set(key, value);
        }
        if let Some(ref format) = self.format {
            set("imageType", Value::from(format.as_str()));
        }
        if let Some(limit) = self.size_limit {
            set("sizeLimit", Value::from(limit));
        }
        if self.send {
            let value = if self.headers.is_empty() {
                Value::Bool(true)
            } else {
                Value::from(self.headers.clone())
            };
            set("sendResult", value);
        }
        Ok(options)
    }
}

/// Split `KEY=VALUE`, parsing VALUE as JSON and falling back to a plain string.
fn parse_option(raw: &str) -> Result<(&str, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .ok_or_else(|| format!("Invalid option '{raw}'. Expected KEY=VALUE"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.trim(), value))
}
