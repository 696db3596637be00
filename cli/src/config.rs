use std::fs;
use std::path::Path;

use blocks::parser::{AnchorPolicy, ConvertOptions};
use serde::Deserialize;

use crate::error::CliError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "blocks.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub convert: ConvertConfig,
    pub excerpt: ExcerptConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ConvertConfig {
    /// Turn `<a href>` anchors into link marks. Otherwise keep their text only.
    pub anchor_links: bool,
    /// Run the linkify pass after every conversion.
    pub linkify: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            anchor_links: true,
            linkify: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ExcerptConfig {
    pub max_chars: usize,
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        ExcerptConfig { max_chars: 160 }
    }
}

impl Config {
    /// Load `path`, or `blocks.toml` when present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, CliError> {
        match path {
            Some(path) => Config::read(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG);
                if default.is_file() {
                    Config::read(default)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Config, CliError> {
        let text = fs::read_to_string(path).map_err(|e| CliError::read(path, e))?;
        match toml::from_str(&text) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(source) => Err(CliError::Config {
                path: path.to_path_buf(),
                text,
                source,
            }),
        }
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            anchors: if self.convert.anchor_links {
                AnchorPolicy::Link
            } else {
                AnchorPolicy::TextOnly
            },
        }
    }
}
