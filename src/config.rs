//! Configuration file loading.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{MatrixcodeError, Result};
use crate::renderer::RendererOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Renderer selection and its options.
    #[serde(default)]
    pub renderer: RendererConfig,
}

/// Which renderer to use and the options passed to it.
#[derive(Debug, Deserialize)]
pub struct RendererConfig {
    /// Renderer name (`image`, `eps`).
    #[serde(default = "default_renderer")]
    pub name: String,
    /// Options keyed by setter name (`imageType`, `sizeLimit`, `sendResult`).
    #[serde(default)]
    pub params: RendererOptions,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { name: default_renderer(), params: RendererOptions::new() }
    }
}

fn default_renderer() -> String {
    "image".to_string()
}

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MATRIXCODE_CONFIG";

impl Config {
    /// Load configuration from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(MatrixcodeError::Configuration(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        toml::from_str(&contents).map_err(|e| {
            let msg = format!("cannot parse {}: {}", path.display(), e.message());
            MatrixcodeError::Configuration(msg)
        })
    }
}

impl FromStr for Config {
    type Err = MatrixcodeError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MatrixcodeError::Configuration(e.message().to_string()))
    }
}

/// The config file to read: `--config`, else `$MATRIXCODE_CONFIG` when set and
/// non-empty, else `~/.config/matrixcode/config.toml`, else `./matrixcode.toml`.
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()).map(PathBuf::from))
        .or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config/matrixcode/config.toml"))
        })
        .unwrap_or_else(|| PathBuf::from("matrixcode.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.renderer.name, "image");
        assert!(config.renderer.params.is_empty());
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.renderer.name, "image");
    }

    #[test]
    fn load_valid_toml() {
        let dir = std::env::temp_dir().join("matrixcode_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[renderer]
name = "eps"

[renderer.params]
imageType = "gif"
sizeLimit = 2048
sendResult = ["Content-Disposition: attachment"]
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.renderer.name, "eps");
        assert_eq!(config.renderer.params["imageType"], json!("gif"));
        assert_eq!(config.renderer.params["sizeLimit"], json!(2048));
        let headers = json!(["Content-Disposition: attachment"]);
        assert_eq!(config.renderer.params["sendResult"], headers);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn params_without_name_keep_default_renderer() {
        let config: Config = toml::from_str("[renderer.params]\nimageType = \"jpg\"\n").unwrap();
        assert_eq!(config.renderer.name, "image");
        assert_eq!(config.renderer.params.len(), 1);
    }

    #[test]
    fn load_invalid_toml() {
        let dir = std::env::temp_dir().join("matrixcode_config_bad_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("bad.toml"), "{err}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_unreadable_path_is_configuration_error() {
        // A directory exists but cannot be read as a file.
        let err = Config::load(&std::env::temp_dir()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn parse_from_str() {
        let config: Config = "[renderer]\nname = \"vector\"\n".parse().unwrap();
        assert_eq!(config.renderer.name, "vector");
        assert!("[renderer]\nname = 3\n".parse::<Config>().unwrap_err().is_configuration());
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
