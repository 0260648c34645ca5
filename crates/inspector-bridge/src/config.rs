//! Bridge configuration loading (`bridge.toml`).

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::dom::depth_from_protocol;
use crate::host::HighlightColors;

/// Environment variable naming the protocol transcript file.
pub const TRANSCRIPT_ENV: &str = "INSPECTOR_BRIDGE_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(SmolStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub log_level: LevelFilter,
    pub transcript: Option<PathBuf>,
    /// Depth used when `DOM.getDocument`/`DOM.requestChildNodes` omit one.
    pub default_depth: usize,
    pub highlight: HighlightColors,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::INFO,
            transcript: None,
            default_depth: 1,
            highlight: HighlightColors::default(),
        }
    }
}

impl BridgeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            ConfigError::Invalid(format!("{}: {err}", path.display()).into())
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: BridgeToml = toml::from_str(text)
            .map_err(|err| ConfigError::Invalid(format!("bridge.toml: {err}").into()))?;
        raw.into_config()
    }

    /// Transcript path from config, else from [`TRANSCRIPT_ENV`].
    #[must_use]
    pub fn transcript_path(&self) -> Option<PathBuf> {
        self.transcript
            .clone()
            .or_else(|| std::env::var_os(TRANSCRIPT_ENV).map(PathBuf::from))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BridgeToml {
    log: Option<LogSection>,
    dom: Option<DomSection>,
    highlight: Option<HighlightSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    level: Option<String>,
    transcript: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DomSection {
    default_depth: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HighlightSection {
    content: Option<String>,
    padding: Option<String>,
    border: Option<String>,
    margin: Option<String>,
}

impl BridgeToml {
    fn into_config(self) -> Result<BridgeConfig, ConfigError> {
        let defaults = BridgeConfig::default();

        let (log_level, transcript) = match self.log {
            Some(log) => {
                let level = match log.level.as_deref() {
                    Some(level) => level.parse::<LevelFilter>().map_err(|_| {
                        ConfigError::Invalid(format!("log.level '{level}' is not a level").into())
                    })?,
                    None => defaults.log_level,
                };
                (level, log.transcript)
            }
            None => (defaults.log_level, None),
        };

        let default_depth = match self.dom.and_then(|dom| dom.default_depth) {
            Some(depth) if depth == -1 || depth >= 1 => depth_from_protocol(Some(depth), 1),
            Some(depth) => {
                return Err(ConfigError::Invalid(
                    format!("dom.default_depth must be -1 or positive, got {depth}").into(),
                ))
            }
            None => defaults.default_depth,
        };

        let mut highlight = defaults.highlight;
        if let Some(section) = self.highlight {
            for (name, value, slot) in [
                ("content", section.content, &mut highlight.content),
                ("padding", section.padding, &mut highlight.padding),
                ("border", section.border, &mut highlight.border),
                ("margin", section.margin, &mut highlight.margin),
            ] {
                if let Some(value) = value {
                    if value.trim().is_empty() {
                        return Err(ConfigError::Invalid(
                            format!("highlight.{name} must not be empty").into(),
                        ));
                    }
                    *slot = value;
                }
            }
        }

        Ok(BridgeConfig {
            log_level,
            transcript,
            default_depth,
            highlight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(BridgeConfig::from_toml_str("").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
[log]
level = "debug"
transcript = "/tmp/bridge.log"

[dom]
default_depth = -1

[highlight]
border = "rgba(0, 0, 0, 1.00)"
"#,
        )
        .unwrap();
        assert_eq!(config.log_level, LevelFilter::DEBUG);
        assert_eq!(config.transcript, Some(PathBuf::from("/tmp/bridge.log")));
        assert_eq!(config.default_depth, usize::MAX);
        assert_eq!(config.highlight.border, "rgba(0, 0, 0, 1.00)");
        assert_eq!(config.highlight.margin, HighlightColors::default().margin);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "[log]\nlevel = \"loud\"",
            "[dom]\ndefault_depth = 0",
            "[highlight]\ncontent = \" \"",
            "[unknown]\nkey = 1",
        ] {
            assert!(
                matches!(BridgeConfig::from_toml_str(text), Err(ConfigError::Invalid(_))),
                "accepted: {text}"
            );
        }
    }
}
