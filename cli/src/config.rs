use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use clap::ValueEnum;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use toml_edit::Value as TomlValue;
use toml_edit::value;

use crate::atomic_write::write_config_atomic;

pub const DEFAULT_STROKE_COLOR: &str = "white";
pub const DEFAULT_FONT: &str = "monospace";
pub const DEFAULT_OPACITY: u8 = 100;

/// Styling new labels get when the command line does not say otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDefaults {
    pub stroke_color: String,
    pub font: String,
    pub opacity: u8,
}

impl Default for LabelDefaults {
    fn default() -> Self {
        Self {
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            font: DEFAULT_FONT.to_string(),
            opacity: DEFAULT_OPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum ConfigKey {
    StrokeColor,
    Font,
    Opacity,
}

impl ConfigKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::StrokeColor => "stroke_color",
            ConfigKey::Font => "font",
            ConfigKey::Opacity => "opacity",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    /// Directory holding `config.toml`; the log file lives next to it.
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn label_defaults(&self) -> anyhow::Result<LabelDefaults> {
        let mut defaults = LabelDefaults::default();
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(defaults);
        };

        let read = |key: ConfigKey| match content.parse::<DocumentMut>() {
            Ok(doc) => read_scalar(&doc, key.as_str()),
            Err(_) => parse_scalar_fallback(&content, key.as_str()),
        };

        if let Some(stroke_color) = read(ConfigKey::StrokeColor) {
            defaults.stroke_color = stroke_color;
        }
        if let Some(font) = read(ConfigKey::Font) {
            defaults.font = font;
        }
        if let Some(raw) = read(ConfigKey::Opacity) {
            match parse_opacity(&raw) {
                Ok(opacity) => defaults.opacity = opacity,
                Err(err) => {
                    tracing::warn!("ignoring opacity in {}: {err}", self.path.display());
                }
            }
        }
        Ok(defaults)
    }

    pub fn set(&self, key: ConfigKey, raw: &str) -> anyhow::Result<()> {
        let new_value = match key {
            ConfigKey::Opacity => TomlValue::from(i64::from(parse_opacity(raw)?)),
            ConfigKey::StrokeColor | ConfigKey::Font => TomlValue::from(raw),
        };

        let content = read_document_string(&self.path)?.unwrap_or_default();
        let updated = match content.parse::<DocumentMut>() {
            Ok(mut doc) => {
                doc[key.as_str()] = value(new_value);
                doc.to_string()
            }
            Err(_) => prepend_scalar_fallback(&content, key.as_str(), &new_value),
        };

        write_config_atomic(&self.path, &updated)
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".textlabel").join("config.toml")
}

fn parse_opacity(raw: &str) -> anyhow::Result<u8> {
    match raw.trim().parse::<u8>() {
        Ok(opacity) if opacity <= 100 => Ok(opacity),
        _ => anyhow::bail!("opacity must be a whole number from 0 to 100, got `{raw}`"),
    }
}

/// Top-level value of `key` as a string, whether it was written as a string or a number.
fn read_scalar(doc: &DocumentMut, key: &str) -> Option<String> {
    let value = doc.get(key).and_then(TomlItem::as_value)?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    value.as_integer().as_ref().map(ToString::to_string)
}

/// Line-based read of a top-level `key = value` for files `toml_edit` rejects.
fn parse_scalar_fallback(contents: &str, key: &str) -> Option<String> {
    let mut result = None;
    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            break;
        }
        let Some((k, v)) = trimmed.split_once('=') else {
            continue;
        };
        if k.trim() != key {
            continue;
        }
        if let Some(v) = parse_fallback_scalar(v) {
            result = Some(v);
        }
    }
    result
}

fn parse_fallback_scalar(raw: &str) -> Option<String> {
    let raw = raw.trim_start();
    // Quoted values may contain `#`, e.g. hex colors.
    if let Some(rest) = raw.strip_prefix('"') {
        let end = rest.find('"')?;
        return Some(rest[..end].to_string());
    }
    let token = raw.split('#').next()?.split_whitespace().next()?;
    Some(token.to_string())
}

fn prepend_scalar_fallback(existing: &str, key: &str, new_value: &TomlValue) -> String {
    format!("{key} = {new_value}\n{existing}")
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}
